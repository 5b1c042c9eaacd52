//! Station network identity and its reconciliation with the backend registry.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::path::PathBuf;

use log::{info, warn};
use macaddr::MacAddr6;

use crate::database::StationRegistry;
use crate::error::IdentityError;
use crate::models::{StationId, StationRecord};

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Address information the station observes about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub ip_address: Ipv4Addr,
    pub mac_address: MacAddr6,
}

impl NetworkIdentity {
    pub fn to_record(&self, station_id: StationId) -> StationRecord {
        StationRecord {
            station_id,
            ip_address: self.ip_address.to_string(),
            mac_address: format_mac(&self.mac_address),
        }
    }
}

/// Registry form of a hardware address: 12 upper-case hex digits, no separators.
pub fn format_mac(mac: &MacAddr6) -> String {
    mac.as_bytes().iter().map(|b| format!("{:02X}", b)).collect()
}

/// Source of the station's own network addresses.
pub trait NetworkProbe {
    fn outbound_ipv4(&self) -> Result<Ipv4Addr, IdentityError>;

    fn hardware_address(&self) -> Result<MacAddr6, IdentityError>;

    fn observe(&self) -> Result<NetworkIdentity, IdentityError> {
        Ok(NetworkIdentity {
            ip_address: self.outbound_ipv4()?,
            mac_address: self.hardware_address()?,
        })
    }
}

/// Probe backed by the host's sockets and sysfs.
#[derive(Debug, Clone)]
pub struct SystemNetworkProbe {
    probe_address: SocketAddr,
    interface: Option<String>,
    sysfs_root: PathBuf,
}

impl SystemNetworkProbe {
    pub fn new(probe_address: SocketAddr, interface: Option<String>) -> Self {
        Self {
            probe_address,
            interface,
            sysfs_root: PathBuf::from(SYS_CLASS_NET),
        }
    }

    #[cfg(test)]
    fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    fn read_mac(&self, interface: &str) -> Result<MacAddr6, IdentityError> {
        let path = self.sysfs_root.join(interface).join("address");
        let raw = fs::read_to_string(&path).map_err(|e| IdentityError::HardwareAddress {
            interface: interface.to_string(),
            details: e.to_string(),
        })?;
        raw.trim()
            .parse::<MacAddr6>()
            .map_err(|e| IdentityError::HardwareAddress {
                interface: interface.to_string(),
                details: e.to_string(),
            })
    }

    /// First interface in name order, other than loopback, with a non-zero address.
    fn first_hardware_interface(&self) -> Result<(String, MacAddr6), IdentityError> {
        let mut names: Vec<String> = fs::read_dir(&self.sysfs_root)
            .map_err(|_| IdentityError::NoInterface)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "lo")
            .collect();
        names.sort();

        names
            .into_iter()
            .find_map(|name| match self.read_mac(&name) {
                Ok(mac) if !mac.is_nil() => Some((name, mac)),
                _ => None,
            })
            .ok_or(IdentityError::NoInterface)
    }
}

impl NetworkProbe for SystemNetworkProbe {
    /// Local address of a UDP socket routed towards the probe address. Nothing is sent.
    fn outbound_ipv4(&self) -> Result<Ipv4Addr, IdentityError> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(IdentityError::Probe)?;
        socket
            .connect(self.probe_address)
            .map_err(IdentityError::Probe)?;
        match socket.local_addr().map_err(IdentityError::Probe)?.ip() {
            IpAddr::V4(ip) => Ok(ip),
            other => Err(IdentityError::NotIpv4(other)),
        }
    }

    fn hardware_address(&self) -> Result<MacAddr6, IdentityError> {
        match &self.interface {
            Some(name) => self.read_mac(name),
            None => self.first_hardware_interface().map(|(_, mac)| mac),
        }
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Unchanged,
    Updated,
    /// The registry has no row for this station, so nothing was updated.
    NotRegistered,
}

/// Compare the observed identity with the registry and update it when they differ.
///
/// Runs once at startup. Errors are for the caller to log; they must not stop collection.
pub async fn reconcile<P, R>(
    station_id: StationId,
    probe: &P,
    registry: &R,
) -> Result<Reconciliation, IdentityError>
where
    P: NetworkProbe,
    R: StationRegistry,
{
    let observed = probe.observe()?.to_record(station_id);
    let stored = registry.get_station_record(station_id).await?;

    if stored.as_ref() == Some(&observed) {
        info!(
            "Station {} network identity unchanged: {} | {}",
            station_id, observed.ip_address, observed.mac_address
        );
        return Ok(Reconciliation::Unchanged);
    }

    let updated = registry.update_station_record(&observed).await?;
    if updated == 0 {
        warn!(
            "Station {} is not registered; network identity {} | {} not recorded",
            station_id, observed.ip_address, observed.mac_address
        );
        return Ok(Reconciliation::NotRegistered);
    }

    info!(
        "Station {} network identity updated: {} | {}",
        station_id, observed.ip_address, observed.mac_address
    );
    Ok(Reconciliation::Updated)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::StorageError;

    struct FixedProbe(Result<NetworkIdentity, ()>);

    impl NetworkProbe for FixedProbe {
        fn outbound_ipv4(&self) -> Result<Ipv4Addr, IdentityError> {
            self.0.map(|id| id.ip_address).map_err(|_| {
                IdentityError::Probe(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no route",
                ))
            })
        }

        fn hardware_address(&self) -> Result<MacAddr6, IdentityError> {
            self.0.map(|id| id.mac_address).map_err(|_| IdentityError::NoInterface)
        }
    }

    #[derive(Default)]
    struct FakeRegistry {
        stored: Option<StationRecord>,
        registered: bool,
        unreachable: bool,
        updates: RefCell<Vec<StationRecord>>,
    }

    impl StationRegistry for FakeRegistry {
        async fn get_station_record(
            &self,
            _station_id: StationId,
        ) -> Result<Option<StationRecord>, StorageError> {
            if self.unreachable {
                return Err(StorageError::Timeout(std::time::Duration::from_secs(30)));
            }
            Ok(self.stored.clone())
        }

        async fn update_station_record(
            &self,
            record: &StationRecord,
        ) -> Result<u64, StorageError> {
            self.updates.borrow_mut().push(record.clone());
            Ok(if self.registered { 1 } else { 0 })
        }
    }

    fn station() -> StationId {
        StationId::new(12).unwrap()
    }

    fn observed() -> NetworkIdentity {
        NetworkIdentity {
            ip_address: Ipv4Addr::new(192, 168, 1, 40),
            mac_address: MacAddr6::new(0xb8, 0x27, 0xeb, 0x01, 0xa2, 0x3c),
        }
    }

    #[test]
    fn mac_is_rendered_without_separators() {
        assert_eq!(format_mac(&observed().mac_address), "B827EB01A23C");
    }

    #[tokio::test]
    async fn matching_record_is_left_alone() {
        let registry = FakeRegistry {
            stored: Some(observed().to_record(station())),
            registered: true,
            ..Default::default()
        };

        let outcome = reconcile(station(), &FixedProbe(Ok(observed())), &registry)
            .await
            .unwrap();

        assert_eq!(outcome, Reconciliation::Unchanged);
        assert!(registry.updates.borrow().is_empty());
    }

    #[tokio::test]
    async fn changed_ip_is_written_back() {
        let mut stale = observed().to_record(station());
        stale.ip_address = "10.0.0.5".to_string();
        let registry = FakeRegistry {
            stored: Some(stale),
            registered: true,
            ..Default::default()
        };

        let outcome = reconcile(station(), &FixedProbe(Ok(observed())), &registry)
            .await
            .unwrap();

        assert_eq!(outcome, Reconciliation::Updated);
        assert_eq!(
            registry.updates.borrow().as_slice(),
            &[StationRecord {
                station_id: station(),
                ip_address: "192.168.1.40".to_string(),
                mac_address: "B827EB01A23C".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn changed_mac_alone_is_written_back() {
        let mut stale = observed().to_record(station());
        stale.mac_address = "B827EB000001".to_string();
        let registry = FakeRegistry {
            stored: Some(stale),
            registered: true,
            ..Default::default()
        };

        let outcome = reconcile(station(), &FixedProbe(Ok(observed())), &registry)
            .await
            .unwrap();

        assert_eq!(outcome, Reconciliation::Updated);
        let updates = registry.updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].ip_address, "192.168.1.40");
        assert_eq!(updates[0].mac_address, "B827EB01A23C");
    }

    #[tokio::test]
    async fn missing_record_triggers_update() {
        let registry = FakeRegistry::default();

        let outcome = reconcile(station(), &FixedProbe(Ok(observed())), &registry)
            .await
            .unwrap();

        assert_eq!(outcome, Reconciliation::NotRegistered);
        assert_eq!(registry.updates.borrow().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_registry_is_reported_not_panicked() {
        let registry = FakeRegistry {
            unreachable: true,
            ..Default::default()
        };

        let result = reconcile(station(), &FixedProbe(Ok(observed())), &registry).await;

        assert!(matches!(result, Err(IdentityError::Registry(_))));
        assert!(registry.updates.borrow().is_empty());
    }

    #[tokio::test]
    async fn probe_failure_skips_the_registry() {
        let registry = FakeRegistry::default();

        let result = reconcile(station(), &FixedProbe(Err(())), &registry).await;

        assert!(matches!(result, Err(IdentityError::Probe(_))));
        assert!(registry.updates.borrow().is_empty());
    }

    #[test]
    fn sysfs_interfaces_skip_loopback_and_nil_addresses() {
        let root = std::env::temp_dir().join(format!(
            "station-collector-net-{}",
            std::process::id()
        ));
        for (name, mac) in [
            ("lo", "00:00:00:00:00:00"),
            ("dummy0", "00:00:00:00:00:00"),
            ("eth0", "b8:27:eb:01:a2:3c"),
            ("wlan0", "b8:27:eb:ff:ff:ff"),
        ] {
            let dir = root.join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("address"), format!("{}\n", mac)).unwrap();
        }

        let probe = SystemNetworkProbe::new("8.8.8.8:80".parse().unwrap(), None)
            .with_sysfs_root(&root);
        assert_eq!(probe.hardware_address().unwrap(), observed().mac_address);

        let pinned = SystemNetworkProbe::new("8.8.8.8:80".parse().unwrap(), Some("wlan0".into()))
            .with_sysfs_root(&root);
        assert_eq!(
            format_mac(&pinned.hardware_address().unwrap()),
            "B827EBFFFFFF"
        );

        let missing = SystemNetworkProbe::new("8.8.8.8:80".parse().unwrap(), Some("eth9".into()))
            .with_sysfs_root(&root);
        assert!(matches!(
            missing.hardware_address(),
            Err(IdentityError::HardwareAddress { .. })
        ));

        let _ = fs::remove_dir_all(&root);
    }
}
