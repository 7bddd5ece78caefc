//! Emits the CloudRange CRD manifests as YAML on stdout.
//!
//! Usage: `cargo run --bin crdgen > config/crds.yaml`

use crds::{CloudScope, IpRange};
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&IpRange::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&CloudScope::crd())?);
    Ok(())
}
