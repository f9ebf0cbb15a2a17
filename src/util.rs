use csv::Writer;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::future::Future;
use std::time::{Duration, Instant};

/// Format the time elapsed since `start` as `HH:MM:SS.mmm`
pub fn format_hms(start: &Instant) -> String {
    let elapsed = start.elapsed();
    let millis = elapsed.subsec_millis();
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis
    )
}

/// Run `future` behind a spinner on `progress`. The spinner is cleared
/// whatever the outcome.
pub async fn with_spinner<F, T>(progress: &MultiProgress, message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = progress.add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;
    spinner.finish_and_clear();
    progress.remove(&spinner);
    output
}

/// Save serializable rows to a CSV file
pub fn save_to_csv<T: Serialize>(
    records: &[T],
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    info!("Saved {} rows to {}", records.len(), filename);
    Ok(())
}

/// Serde adapter for backend datetimes.
///
/// The API emits RFC 3339 strings, but records created from naive form
/// input come back without an offset; those are read as UTC.
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised datetime `{raw}`")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
            return Some(datetime.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use indicatif::ProgressDrawTarget;

    #[test]
    fn test_parse_offset_and_naive_datetimes() {
        let with_offset = flexible_datetime::parse("2024-10-31T23:15:00.250000+01:00").unwrap();
        assert_eq!(with_offset.hour(), 22);

        let naive = flexible_datetime::parse("2024-10-31T23:15:00").unwrap();
        assert_eq!(naive.day(), 31);
        assert_eq!(naive.hour(), 23);

        let form_input = flexible_datetime::parse("2024-10-31T23:15").unwrap();
        assert_eq!(form_input.minute(), 15);

        assert!(flexible_datetime::parse("last tuesday").is_none());
    }

    #[tokio::test]
    async fn test_with_spinner_returns_output() {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let value = with_spinner(&progress, "working", async { 41 + 1 }).await;
        assert_eq!(value, 42);
    }

    #[test]
    fn test_save_to_csv_writes_header_and_rows() {
        #[derive(Serialize)]
        struct Row {
            id: &'static str,
            distance_km: f64,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let path = path.to_str().unwrap();
        save_to_csv(&[Row { id: "a", distance_km: 3.2 }, Row { id: "b", distance_km: 18.9 }], path)
            .unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "id,distance_km\na,3.2\nb,18.9\n");
    }
}
