//! Static membership source for fixed deployments and tests.

use tokio::sync::mpsc;

use crate::discovery::{Instancer, MembershipEvent};

/// Emits one event carrying a fixed address list to every subscriber.
///
/// Stands in for the Consul watcher when discovery is disabled in config.
pub struct FixedInstancer {
    instances: Vec<String>,
}

impl FixedInstancer {
    pub fn new(instances: Vec<String>) -> Self {
        Self { instances }
    }
}

impl Instancer for FixedInstancer {
    fn register(&self, subscriber: mpsc::UnboundedSender<MembershipEvent>) {
        let _ = subscriber.send(MembershipEvent::instances(self.instances.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_the_configured_list_on_register() {
        let instancer = FixedInstancer::new(vec!["h1:5984".into(), "h2:5984".into()]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        instancer.register(tx);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.instances, vec!["h1:5984", "h2:5984"]);
        assert!(event.error.is_none());
    }
}
