pub mod publish_gate;
pub mod reconcile;
pub mod submission;
pub mod subscription;
