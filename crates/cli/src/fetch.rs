//! `ordrec run` platform fetch — pull the dashboard summary for comparison.
//!
//! One unary GET, no retries. A refused connection degrades the run to the
//! manual-only comparison; any other failure ends it.

use std::time::Duration;

use ordrec_recon::config::PlatformConfig;
use ordrec_recon::model::PlatformSummary;

use crate::CliError;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// GET `{url}?month={month}` and decode the summary payload.
///
/// `Ok(None)` means the endpoint was unreachable (connection refused or
/// timed out) and the caller should fall back to manual comparison.
pub fn fetch_platform_summary(
    config: &PlatformConfig,
    quiet: bool,
) -> Result<Option<PlatformSummary>, CliError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| CliError::platform(e.to_string()))?;

    let mut request = client.get(&config.url);
    if let Some(ref month) = config.month {
        request = request.query(&[("month", month.as_str())]);
    }

    let response = match request.send() {
        Ok(r) => r,
        Err(e) if e.is_connect() || e.is_timeout() => {
            if !quiet {
                eprintln!("warning: cannot reach platform API ({e}); using manual comparison only");
            }
            return Ok(None);
        }
        Err(e) => return Err(CliError::platform(e.to_string())),
    };

    let status = response.status();
    if !status.is_success() {
        return Err(CliError::platform(format!(
            "platform returned {status} for {}",
            config.url
        )));
    }

    let summary: PlatformSummary = response
        .json()
        .map_err(|e| CliError::platform(format!("undecodable platform payload: {e}")))?;

    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_PLATFORM;
    use httpmock::prelude::*;

    fn config(url: String) -> PlatformConfig {
        PlatformConfig { url, month: Some("2025-05".into()) }
    }

    #[test]
    fn parses_camel_case_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/dashboard/summary")
                .query_param("month", "2025-05");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"totalSales":164.86,"totalOrders":11,"totalRefunds":0.0,
                        "platformFees":16.49,"stripeFees":5.08,"netDeposit":143.29}"#,
                );
        });

        let summary = fetch_platform_summary(&config(server.url("/api/dashboard/summary")), true)
            .unwrap()
            .unwrap();
        mock.assert();

        assert_eq!(summary.total_orders, 11);
        assert!((summary.total_sales - 164.86).abs() < 1e-9);
        assert!((summary.net_deposit - 143.29).abs() < 1e-9);
    }

    #[test]
    fn absent_keys_read_as_zero() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/summary");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"totalSales":95.01}"#);
        });

        let summary = fetch_platform_summary(&config(server.url("/summary")), true)
            .unwrap()
            .unwrap();
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_refunds, 0.0);
    }

    #[test]
    fn non_200_ends_the_run() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/summary");
            then.status(500);
        });

        let err = fetch_platform_summary(&config(server.url("/summary")), true).unwrap_err();
        assert_eq!(err.code, EXIT_PLATFORM);
        assert!(err.message.contains("500"));
    }

    #[test]
    fn connection_refused_degrades_to_manual() {
        // Nothing listens on port 1
        let result =
            fetch_platform_summary(&config("http://127.0.0.1:1/summary".into()), true).unwrap();
        assert!(result.is_none());
    }
}
