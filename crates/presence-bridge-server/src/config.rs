//! Command line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use presence_bridge_core::DEFAULT_MAX_COUNT;
use presence_bridge_serial::SerialConfig;

#[derive(Parser, Debug)]
#[command(name = "presence-bridge")]
#[command(version, about = "Relay a serial door controller to WebSocket clients")]
pub struct Args {
    /// Serial device path of the door controller.
    #[arg(long, env = "PRESENCE_BRIDGE_DEVICE", default_value = "/dev/ttyACM0")]
    pub device: String,

    /// Serial baud rate.
    #[arg(long, env = "PRESENCE_BRIDGE_BAUD", default_value_t = 9600)]
    pub baud_rate: u32,

    /// Address to listen on for WebSocket clients.
    #[arg(long, env = "PRESENCE_BRIDGE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on for WebSocket clients.
    #[arg(long, env = "PRESENCE_BRIDGE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Max occupancy count before any client sets one.
    #[arg(
        long,
        env = "PRESENCE_BRIDGE_INITIAL_MAX",
        default_value_t = DEFAULT_MAX_COUNT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub initial_max: u32,

    /// List available serial ports and exit.
    #[arg(long)]
    pub list_ports: bool,
}

impl Args {
    #[must_use]
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig::new(self.device.clone(), self.baud_rate)
    }

    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["presence-bridge"]).unwrap();

        assert_eq!(args.serial_config(), SerialConfig::new("/dev/ttyACM0", 9600));
        assert_eq!(args.listen_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(args.initial_max, 5);
        assert!(!args.list_ports);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "presence-bridge",
            "--device",
            "COM6",
            "--baud-rate",
            "115200",
            "--host",
            "127.0.0.1",
            "--port",
            "9001",
            "--initial-max",
            "12",
        ])
        .unwrap();

        assert_eq!(args.serial_config(), SerialConfig::new("COM6", 115_200));
        assert_eq!(args.listen_addr(), "127.0.0.1:9001".parse().unwrap());
        assert_eq!(args.initial_max, 12);
    }

    #[test]
    fn test_initial_max_must_be_positive() {
        assert!(Args::try_parse_from(["presence-bridge", "--initial-max", "0"]).is_err());
        assert!(Args::try_parse_from(["presence-bridge", "--initial-max", "-1"]).is_err());
    }
}
