use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use venus_virtual::protocol::{ProtocolHandler, Request, RequestType, Response};
use venus_virtual::{ConfigValue, DeviceConfig, DeviceKind, Value};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8090";
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device_arg = || {
        Arg::with_name("device")
            .help("Device id")
            .required(true)
    };
    let path_arg = || {
        Arg::with_name("path")
            .help("Property path, e.g. Ac/L1/Power")
            .required(true)
    };
    let value_arg = || {
        Arg::with_name("value")
            .help("New value (number, or text)")
            .required(true)
    };

    let matches = App::new("vdev")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Virtual energy devices - client for the device bus simulator")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("host")
                .short("H")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table"])
                .default_value("table")
                .global(true),
        )
        .subcommand(SubCommand::with_name("ping").about("Test connection to the simulator"))
        .subcommand(
            SubCommand::with_name("create")
                .about("Create a virtual device")
                .arg(
                    Arg::with_name("kind")
                        .help("Device kind (grid, heatpump, meteo, tank, temperature, pvinverter, digitalinput, relay)")
                        .required(true),
                )
                .arg(device_arg())
                .arg(
                    Arg::with_name("instance")
                        .short("i")
                        .long("instance")
                        .value_name("N")
                        .help("Device instance number")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .value_name("NAME")
                        .help("Custom display name")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("phases")
                        .long("phases")
                        .value_name("N")
                        .help("Number of AC phases (grid only)")
                        .takes_value(true),
                ),
        )
        .subcommand(SubCommand::with_name("close").about("Close a virtual device").arg(device_arg()))
        .subcommand(SubCommand::with_name("list").about("List virtual devices"))
        .subcommand(
            SubCommand::with_name("describe")
                .about("Show the interface descriptor and values of a device")
                .arg(device_arg()),
        )
        .subcommand(
            SubCommand::with_name("get")
                .about("Read a property")
                .arg(device_arg())
                .arg(path_arg())
                .arg(
                    Arg::with_name("text")
                        .short("t")
                        .long("text")
                        .help("Show the formatted text instead of the raw value"),
                ),
        )
        .subcommand(
            SubCommand::with_name("set")
                .about("Write a property as a bus client would")
                .arg(device_arg())
                .arg(path_arg())
                .arg(value_arg()),
        )
        .subcommand(
            SubCommand::with_name("publish")
                .about("Update a property and emit a change signal")
                .arg(device_arg())
                .arg(path_arg())
                .arg(value_arg()),
        )
        .subcommand(SubCommand::with_name("watch").about("Print change signals as they arrive"))
        .get_matches();

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse::<u16>()?;
    let format = matches.value_of("format").unwrap_or("table");

    let request_type = match matches.subcommand() {
        ("ping", _) => RequestType::Ping,
        ("create", Some(sub)) => RequestType::CreateDevice {
            config: create_config(sub),
        },
        ("close", Some(sub)) => RequestType::CloseDevice {
            device: required(sub, "device"),
        },
        ("list", _) => RequestType::ListDevices,
        ("describe", Some(sub)) => RequestType::Describe {
            device: required(sub, "device"),
        },
        ("get", Some(sub)) if sub.is_present("text") => RequestType::GetText {
            device: required(sub, "device"),
            path: required(sub, "path"),
        },
        ("get", Some(sub)) => RequestType::GetValue {
            device: required(sub, "device"),
            path: required(sub, "path"),
        },
        ("set", Some(sub)) => RequestType::SetValue {
            device: required(sub, "device"),
            path: required(sub, "path"),
            value: parse_value(&required(sub, "value")),
        },
        ("publish", Some(sub)) => RequestType::Publish {
            device: required(sub, "device"),
            path: required(sub, "path"),
            value: parse_value(&required(sub, "value")),
        },
        ("watch", _) => return watch(host, port).await,
        _ => return Ok(()),
    };

    let mut protocol = ProtocolHandler::new();
    let request = Request {
        id: protocol.next_request_id(),
        request_type,
    };
    let response = send_request(host, port, &protocol, &request).await?;
    print_response(&response, format);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn required(matches: &ArgMatches<'_>, name: &str) -> String {
    // clap enforces presence of required arguments
    matches.value_of(name).unwrap_or_default().to_string()
}

fn create_config(matches: &ArgMatches<'_>) -> DeviceConfig {
    let mut config = DeviceConfig::new(
        required(matches, "device"),
        DeviceKind::parse(&required(matches, "kind")),
    );
    config.device_instance = matches.value_of("instance").map(ConfigValue::from);
    config.name = matches.value_of("name").map(str::to_string);
    config.nr_of_phases = matches.value_of("phases").map(ConfigValue::from);
    config
}

/// Numbers become numeric values, anything else is sent as text.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(|v| !matches!(v, Value::Text(_)))
        .unwrap_or_else(|| Value::Text(raw.to_string()))
}

async fn send_request(
    host: &str,
    port: u16,
    protocol: &ProtocolHandler,
    request: &Request,
) -> Result<Response, Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", host, port);
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("{} Failed to connect to simulator at {}", "error:".red(), addr.bright_white());
            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                eprintln!("   Start it with {}", "vdev-simulator".bright_cyan());
            }
            return Err(e.into());
        }
    };

    let (reader, mut writer) = stream.into_split();
    writer
        .write_all(protocol.serialize_request(request)?.as_bytes())
        .await?;
    writer.write_all(b"\n").await?;

    let mut lines = BufReader::new(reader).lines();
    let response = tokio::time::timeout(
        RESPONSE_TIMEOUT,
        read_response(&mut lines, protocol, request.id),
    )
    .await??;

    Ok(response)
}

/// Skips change signals until the response to `request_id` arrives.
async fn read_response(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    protocol: &ProtocolHandler,
    request_id: u32,
) -> std::io::Result<Response> {
    while let Some(line) = lines.next_line().await? {
        if let Ok(response) = protocol.parse_response(&line) {
            // Unparsable requests are answered with id 0
            if response.id == request_id || response.id == 0 {
                return Ok(response);
            }
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "Server closed connection",
    ))
}

async fn watch(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let stream = TcpStream::connect(format!("{}:{}", host, port)).await?;
    println!("{}", "Watching change signals (Ctrl+C to stop)...".bright_blue().bold());

    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        let parsed: serde_json::Value = match serde_json::from_str(&line) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };
        let signal = &parsed["signal"];
        if signal.is_null() {
            continue;
        }
        println!(
            "{} {} = {}",
            signal["object_path"].as_str().unwrap_or("?").dimmed(),
            signal["property"].as_str().unwrap_or("?").bright_white(),
            signal["text"].as_str().unwrap_or("").bright_green()
        );
    }
    Ok(())
}

fn print_response(response: &Response, format: &str) {
    if format == "json" {
        match serde_json::to_string_pretty(response) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", "error:".red(), e),
        }
        return;
    }

    if !response.is_success() {
        println!(
            "{} {:?}: {}",
            "failed".bright_red(),
            response.status,
            response.message.as_deref().unwrap_or("")
        );
        return;
    }

    match &response.payload {
        None => println!("{}", "OK".bright_green()),
        Some(serde_json::Value::Object(map)) if map.contains_key("devices") => {
            print_device_table(&map["devices"]);
        }
        Some(serde_json::Value::Object(map)) if map.contains_key("descriptor") => {
            print_descriptor(&map["descriptor"], &map["values"]);
        }
        Some(serde_json::Value::String(text)) => println!("{}", text.bright_green()),
        Some(payload) => println!("{}", payload),
    }
}

fn print_device_table(devices: &serde_json::Value) {
    let Some(devices) = devices.as_array() else {
        return;
    };
    if devices.is_empty() {
        println!("{}", "No devices".dimmed());
        return;
    }

    println!(
        "{:<16} {:<14} {:<10} {}",
        "ID".bright_white().bold(),
        "KIND".bright_white().bold(),
        "STATE".bright_white().bold(),
        "STATUS".bright_white().bold()
    );
    for device in devices {
        let status = device["status"]["text"].as_str().unwrap_or("");
        let status = match device["status"]["fill"].as_str() {
            Some("green") => status.green(),
            Some("red") => status.red(),
            Some("yellow") => status.yellow(),
            _ => status.dimmed(),
        };
        println!(
            "{:<16} {:<14} {:<10} {}",
            device["id"].as_str().unwrap_or("?"),
            device["kind"].as_str().unwrap_or("?"),
            device["state"].as_str().unwrap_or("?"),
            status
        );
    }
}

fn print_descriptor(descriptor: &serde_json::Value, values: &serde_json::Value) {
    let Some(entries) = descriptor.as_object() else {
        return;
    };
    for (name, entry) in entries {
        println!(
            "{:<28} {} {}",
            name.bright_white(),
            entry["type"].as_str().unwrap_or("?").dimmed(),
            values[name]
        );
    }
}
