use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use ambisense_embedded::NetworkLink;
use esp_idf_svc::wifi::*;
use log::{info, warn};

use crate::error::{AmbisenseError, Result};

const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

pub struct WifiManager {
    wifi: BlockingWifi<EspWifi<'static>>,
    last_reconnect: Option<Instant>,
}

impl WifiManager {
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self {
            wifi,
            last_reconnect: None,
        }
    }

    fn configure(&mut self, ssid: &str, password: &str) -> Result<()> {
        let wifi_configuration: Configuration = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| AmbisenseError::WifiConnection("Invalid SSID".to_string()))?,
            bssid: None,
            auth_method: AuthMethod::WPA2Personal,
            password: password
                .try_into()
                .map_err(|_| AmbisenseError::WifiConnection("Invalid password".to_string()))?,
            channel: None,
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_configuration)?;

        self.wifi.start()?;
        info!("WiFi started");

        // Association is polled by the caller
        self.wifi.wifi_mut().connect()?;

        Ok(())
    }

    /// Re-issues the association request after the link dropped.
    pub fn ensure_connected(&mut self) {
        if self.is_connected() {
            return;
        }
        if self
            .last_reconnect
            .is_some_and(|at| at.elapsed() < RECONNECT_INTERVAL)
        {
            return;
        }
        self.last_reconnect = Some(Instant::now());

        warn!("WiFi link lost, reconnecting");
        if let Err(e) = self.wifi.wifi_mut().connect() {
            warn!("WiFi reconnect failed: {}", e);
        }
    }
}

impl NetworkLink for WifiManager {
    type Error = AmbisenseError;

    fn begin(&mut self, ssid: &str, password: &str) -> Result<()> {
        self.configure(ssid, password)
    }

    fn is_connected(&mut self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }
}
