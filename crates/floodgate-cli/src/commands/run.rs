use std::path::Path;

use anyhow::Context;
use floodgate_core::epoch_secs;
use floodgate_gate::{CommandSwitch, Floodgate, RunReport};
use floodgate_sampler::InstanceSampler;

use super::load_config;

pub fn run(config_path: &Path, dry_run: bool, format: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let sampler = InstanceSampler::new(&config.base_url, config.timeout()?);
    let switch = CommandSwitch::from_config(&config.command)?;
    let gate = Floodgate::from_config(sampler, switch, &config)?.with_dry_run(dry_run);

    let report = gate
        .run(epoch_secs())
        .with_context(|| format!("floodgate run against {}", config.base_url))?;

    println!("{}", render(&report, format)?);
    Ok(())
}

fn render(report: &RunReport, format: &str) -> anyhow::Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(report)?),
        _ => Ok(report.lines().join("\n")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use floodgate_core::Sample;
    use floodgate_gate::{BaselineSource, Decision};
    use floodgate_history::HistoryLog;

    /// Answer a single instance request with the given user count.
    fn serve_count(user_count: u64) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let body = format!(r#"{{"stats":{{"user_count":{user_count}}}}}"#);
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        (format!("http://{addr}"), handle)
    }

    fn report() -> RunReport {
        RunReport {
            time: 1_700_000_000,
            decision: Decision {
                open: false,
                current: 120,
                baseline: Some(Sample::new(1_699_996_000, 100)),
                source: BaselineSource::Window,
                delta: Some(20),
            },
            window_secs: 3600,
            recorded: true,
            compacted: 0,
            dry_run: true,
        }
    }

    #[test]
    fn text_output_has_three_status_lines() {
        let text = render(&report(), "text").unwrap();
        assert_eq!(
            text,
            "Current:  120 users\nHistoric: 100 users as of 4000 sec ago\nOpen reg: false (1-hour delta: 20)"
        );
    }

    #[test]
    fn json_output_is_the_report() {
        let json = render(&report(), "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["decision"]["current"], 120);
        assert_eq!(value["dry_run"], true);
    }

    #[test]
    fn dry_run_records_the_sample_without_actuating() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("floodgate.dat");
        let (base_url, server) = serve_count(42);
        let config_path = dir.path().join("floodgate.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
base_url = "{base_url}"

[history]
path = "{}"

[command]
program = "/nonexistent/floodgate-admin"
"#,
                log_path.display()
            ),
        )
        .unwrap();

        run(&config_path, true, "json").unwrap();
        server.join().unwrap();

        let samples = HistoryLog::new(&log_path).samples().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 42);
    }

    #[test]
    fn run_without_config_fails_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("missing.toml");
        let err = run(&config_path, true, "text").unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }
}
