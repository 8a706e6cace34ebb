use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

use pvgpool::AddressAssignment;

/// Bus d'abonnement aux affectations publiées par le scheduler.
///
/// Les abonnés disparus sont purgés à la publication suivante ; une
/// publication sans abonné n'est pas une erreur.
#[derive(Clone, Default)]
pub struct AssignmentBus {
    subscribers: Arc<Mutex<Vec<Sender<AddressAssignment>>>>,
}

impl AssignmentBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<AddressAssignment> {
        let (tx, rx) = unbounded::<AddressAssignment>();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(tx);
        }
        rx
    }

    pub(crate) fn publish(&self, assignment: AddressAssignment) {
        let mut subscribers = self.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(assignment.clone()).is_ok());
        let dropped = before - subscribers.len();
        if dropped > 0 {
            trace!(dropped, "pruned dead assignment subscribers");
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvgutils::Address;

    fn assignment() -> AddressAssignment {
        vec![Address::from_u32(1), Address::from_u32(2)]
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = AssignmentBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        bus.publish(assignment());

        assert_eq!(rx1.try_recv().unwrap(), assignment());
        assert_eq!(rx2.try_recv().unwrap(), assignment());
    }

    #[test]
    fn test_dead_subscribers_are_pruned() {
        let bus = AssignmentBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();
        drop(rx2);

        bus.publish(assignment());

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(rx1.try_recv().unwrap(), assignment());
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let bus = AssignmentBus::new();
        bus.publish(assignment());
        assert_eq!(bus.subscriber_count(), 0);
    }
}
