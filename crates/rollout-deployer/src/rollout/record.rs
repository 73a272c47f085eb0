//! Deployment audit record
//!
//! One write-once file per deployment, flat `key=value` lines. The
//! deployer never reads it back; it exists for operators digging into
//! what was rolled out when.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

/// Local audit artifact written after the instance refresh is created.
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    pub refresh_id: String,
    pub image_id: String,
    pub template_id: String,
    pub template_version: i64,
    pub fleet_name: String,
    pub deployed_at: DateTime<Utc>,
    pub project: String,
    pub environment: String,
    pub region: String,
}

impl DeploymentRecord {
    /// Timestamped file name, unique per deployment.
    pub fn file_name(&self) -> String {
        format!(
            "deployment-info-{}.txt",
            self.deployed_at.format("%Y%m%d-%H%M%S")
        )
    }

    fn render(&self) -> String {
        format!(
            "refresh_id={}\n\
             image_id={}\n\
             launch_template_id={}\n\
             launch_template_version={}\n\
             fleet_name={}\n\
             deployed_at={}\n\
             project={}\n\
             environment={}\n\
             region={}\n",
            self.refresh_id,
            self.image_id,
            self.template_id,
            self.template_version,
            self.fleet_name,
            self.deployed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.project,
            self.environment,
            self.region,
        )
    }

    /// Write the record into `dir` and return the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.render())
            .with_context(|| format!("Failed to write deployment record {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> DeploymentRecord {
        DeploymentRecord {
            refresh_id: "1f3a8c2e-refresh".to_string(),
            image_id: "ami-0123456789abcdef0".to_string(),
            template_id: "lt-0fedcba9876543210".to_string(),
            template_version: 7,
            fleet_name: "web-fleet".to_string(),
            deployed_at: Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap(),
            project: "image-pipeline-poc".to_string(),
            environment: "dev".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn file_name_is_timestamped() {
        assert_eq!(
            record().file_name(),
            "deployment-info-20240315-123045.txt"
        );
    }

    #[test]
    fn written_record_round_trips_key_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = record().write_to(dir.path()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let get = |key: &str| -> String {
            contents
                .lines()
                .find_map(|line| line.strip_prefix(&format!("{key}=")))
                .unwrap_or_else(|| panic!("missing key {key}"))
                .to_string()
        };

        assert_eq!(get("refresh_id"), "1f3a8c2e-refresh");
        assert_eq!(get("image_id"), "ami-0123456789abcdef0");
        assert_eq!(get("launch_template_version"), "7");
        assert_eq!(get("fleet_name"), "web-fleet");
        assert_eq!(get("deployed_at"), "2024-03-15T12:30:45Z");
        assert_eq!(get("region"), "us-east-1");
    }

    #[test]
    fn write_fails_into_missing_directory() {
        let result = record().write_to(Path::new("/nonexistent/deploy-records"));
        assert!(result.is_err());
    }
}
