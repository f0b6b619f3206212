//! Host resource snapshot for the status header

use serde::Serialize;

use crate::transport::Transport;

/// Point-in-time host figures. Each field is `None` when it could not be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemSnapshot {
    /// Busy share of CPU time since boot, in percent
    pub cpu_percent: Option<f64>,
    /// `used / total` memory in GiB
    pub ram: Option<String>,
    /// Used, available and use% of the root filesystem
    pub disk: Option<String>,
}

const MEMINFO_AWK: &str = "/MemTotal/ {t=$2} /MemAvailable/ {a=$2} \
    END {printf \"%.1fG / %.1fG\", (t-a)/1024/1024, t/1024/1024}";

/// CPU busy percentage from the aggregate `cpu` line of `/proc/stat`
pub fn parse_cpu_line(line: &str) -> Option<f64> {
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let values: Vec<u64> = fields
        .take(8)
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    if values.len() < 8 {
        return None;
    }
    let total: u64 = values.iter().sum();
    if total == 0 {
        return None;
    }
    // idle and iowait
    let idle = values[3] + values[4];
    let used = (total - idle) as f64;
    Some((100.0 * used / total as f64 * 100.0).round() / 100.0)
}

/// Used, available and use% columns of the first data row of `df -h`
pub fn parse_df(output: &str) -> Option<String> {
    let row = output.lines().nth(1)?;
    let cols: Vec<&str> = row.split_whitespace().collect();
    if cols.len() < 5 {
        return None;
    }
    Some(cols[2..5].join(" "))
}

async fn capture(transport: &Transport, argv: &[&str]) -> Option<String> {
    match transport.run(argv, true).await {
        Ok(output) if output.success() => output.stdout,
        _ => None,
    }
}

/// Read CPU, memory and disk figures from the host
pub async fn static_snapshot(transport: &Transport) -> SystemSnapshot {
    let cpu_percent = capture(transport, &["grep", "^cpu ", "/proc/stat"])
        .await
        .and_then(|out| out.lines().next().and_then(parse_cpu_line));

    let ram = capture(transport, &["awk", MEMINFO_AWK, "/proc/meminfo"])
        .await
        .map(|out| out.trim().to_string())
        .filter(|s| !s.is_empty());

    let disk = capture(transport, &["df", "-h", "/"])
        .await
        .and_then(|out| parse_df(&out));

    SystemSnapshot {
        cpu_percent,
        ram,
        disk,
    }
}
