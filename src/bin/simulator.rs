use clap::{App, Arg};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};
use venus_virtual::bus::ItemsChanged;
use venus_virtual::protocol::{ProtocolHandler, ResponseStatus};
use venus_virtual::{BusAddress, DeviceConfig, DeviceHost, LocalBus};

const DEFAULT_PORT: &str = "8090";

type SharedHost = Arc<Mutex<DeviceHost<LocalBus>>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("vdev-simulator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Virtual device bus simulator")
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("TCP port for the request protocol")
                .takes_value(true)
                .default_value(DEFAULT_PORT),
        )
        .arg(
            Arg::with_name("devices")
                .short("d")
                .long("devices")
                .value_name("FILE")
                .help("JSON file with a list of device configurations to create at startup")
                .takes_value(true),
        )
        .get_matches();

    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse::<u16>()?;

    let address = BusAddress::from_env();
    info!(
        "Bus address {} (auth {:?}), serving on the in-process bus",
        address.address(),
        address.auth_methods()
    );

    let bus = LocalBus::new();
    let host: SharedHost = Arc::new(Mutex::new(DeviceHost::new(bus.clone())));

    if let Some(path) = matches.value_of("devices") {
        let configs: Vec<DeviceConfig> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let mut host_guard = host.lock().await;
        for config in configs {
            let id = config.id.clone();
            match host_guard.create_device(config) {
                Ok(device) => info!("{}: {}", id, device.status().text),
                Err(e) => warn!("Skipping device {}: {}", id, e),
            }
        }
    }

    let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on port {}", port);

    let server_host = Arc::clone(&host);
    let server_bus = bus.clone();
    let server = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Client connected: {}", addr);
                    let client_host = Arc::clone(&server_host);
                    let signals = server_bus.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, client_host, signals).await {
                            warn!("Client {} error: {}", addr, e);
                        }
                        info!("Client {} disconnected", addr);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    server.abort();
    host.lock().await.close_all();

    Ok(())
}

async fn handle_client(
    stream: TcpStream,
    host: SharedHost,
    mut signals: broadcast::Receiver<ItemsChanged>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let writer = Arc::new(Mutex::new(writer));

    // Forward change signals to the client
    let signal_writer = Arc::clone(&writer);
    let signal_task = tokio::spawn(async move {
        loop {
            let signal = match signals.recv().await {
                Ok(signal) => signal,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Client lagging, {} signals dropped", missed);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let line = json!({ "signal": signal }).to_string();
            let mut writer_guard = signal_writer.lock().await;
            if writer_guard.write_all(line.as_bytes()).await.is_err()
                || writer_guard.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
    });

    let mut protocol = ProtocolHandler::new();
    let mut line = String::new();
    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }

                let response = match protocol.parse_request(&line) {
                    Ok(request) => {
                        info!("Request {}: {:?}", request.id, request.request_type);
                        host.lock().await.handle_request(request)
                    }
                    Err(e) => {
                        warn!("Rejected request: {}", e);
                        protocol.create_error_response(0, ResponseStatus::InvalidRequest, &e.to_string())
                    }
                };

                let response_json = protocol.serialize_response(&response)?;
                let mut writer_guard = writer.lock().await;
                writer_guard.write_all(response_json.as_bytes()).await?;
                writer_guard.write_all(b"\n").await?;
            }
            Err(e) => {
                error!("Error reading from client: {}", e);
                break;
            }
        }
    }

    signal_task.abort();
    Ok(())
}
