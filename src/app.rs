// `app.rs` composes the tool: it resolves settings, builds the MQTT client,
// starts the background event-loop task, runs the interactive command loop,
// and tears everything down in order when the loop exits.
use std::sync::Arc;

use rumqttc::{AsyncClient, MqttOptions, TlsConfiguration, Transport};
use tokio::sync::Notify;
use tokio::task;

use crate::config::Settings;
use crate::mqtt::{self, Publisher};
use crate::repl;

pub async fn run() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    println!(
        "Connecting to {}:{} topic={} qos={:?} retain={}",
        settings.host, settings.port, settings.topic, settings.qos, settings.retain
    );

    let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
    options.set_keep_alive(std::time::Duration::from_secs(5));

    match &settings.credentials {
        Some((user, pass)) => {
            options.set_credentials(user, pass);
            println!("Using MQTT credentials from environment {}:*******", user);
        }
        None => {
            // No credentials configured; proceed unauthenticated.
            println!("No MQTT credentials provided; connecting without authentication");
        }
    }

    if let Some(path) = &settings.ca_file {
        let ca = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Could not read MQTT_CA_FILE {}: {}", path, e))?;
        options.set_transport(Transport::Tls(TlsConfiguration::Simple {
            ca,
            alpn: None,
            client_auth: None,
        }));
        println!("TLS enabled with trust anchor {}", path);
    }

    let (client, eventloop) = AsyncClient::new(options, 10);

    // The event-loop task owns the in-flight table; the foreground only
    // feeds it records through this channel.
    let (pending_tx, pending_rx) = crossbeam_channel::unbounded();
    let shutdown = Arc::new(Notify::new());
    let background = task::spawn(mqtt::run_event_loop(
        eventloop,
        pending_rx,
        shutdown.clone(),
    ));

    let publisher = Publisher::new(client, &settings, pending_tx);
    let result = repl::run(&publisher).await;

    // Orderly shutdown: let the disconnect go out, then stop the background
    // task. Any publish already submitted has had its grace period.
    publisher.disconnect().await;
    shutdown.notify_one();
    let _ = background.await;

    result
}
