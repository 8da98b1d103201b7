use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::{
    cli::CheckArgs,
    config::{AppConfig, ConfigError},
    domain::{ClassificationRecord, Verdict},
    engine::{ClassificationEngine, EngineSettings},
    fetch::{self, Fetcher},
    infrastructure::pause::Pause,
    platforms::{registry, Platform},
    tabular::{read_input, InputTable, OutputWriter, ACCESS_COLUMN},
};

const DEFAULT_SECONDARY_COLUMN: &str = "ebook package";

/// One batch run. The fetcher session and the pause are supplied by the
/// caller and borrowed for the duration of `run`.
pub struct AccessCheckApp {
    config: AppConfig,
    platform: &'static Platform,
    input: InputTable,
    output: OutputWriter,
    output_path: PathBuf,
}

impl AccessCheckApp {
    pub fn initialize(config: AppConfig, args: &CheckArgs) -> Result<Self> {
        let platform = registry()
            .resolve(&args.platform)
            .ok_or_else(|| ConfigError::UnknownPlatform(args.platform.clone()))?;
        if platform.code != args.platform.trim().to_ascii_lowercase() {
            tracing::info!(target: "app", alias = %args.platform, platform = platform.code, "legacy platform code resolved");
        }

        let input = read_input(&args.input)?;

        let mut extra_columns = vec![ACCESS_COLUMN];
        if config.output.ebook_package {
            if platform.secondary.is_none() {
                tracing::warn!(
                    target: "app",
                    platform = platform.code,
                    "platform has no ebook package extractor; column will read N/A"
                );
            }
            extra_columns.push(
                platform
                    .secondary
                    .as_ref()
                    .map(|field| field.column)
                    .unwrap_or(DEFAULT_SECONDARY_COLUMN),
            );
        }
        let output = OutputWriter::open(
            &args.output,
            &input.headers,
            &extra_columns,
            config.output.write_bom,
        )?;

        Ok(Self {
            config,
            platform,
            input,
            output,
            output_path: args.output.clone(),
        })
    }

    /// Opens the session the platform asks for, with its session policy applied.
    pub async fn open_session(&self) -> Result<Box<dyn Fetcher>> {
        fetch::open_session(self.platform, &self.config.fetch)
            .await
            .with_context(|| format!("failed to open {} session", self.platform.code))
    }

    pub async fn run(self, fetcher: &mut dyn Fetcher, pause: &dyn Pause) -> Result<RunSummary> {
        let AccessCheckApp {
            config,
            platform,
            input,
            mut output,
            output_path,
        } = self;

        let settings = EngineSettings::for_platform(platform, &config);
        let courtesy_delay = settings.courtesy_delay;
        let engine = ClassificationEngine::new(platform, settings, pause);

        let total = input.records.len();
        let mut summary = RunSummary::start(platform.code, total);
        tracing::info!(
            target: "app",
            platform = platform.code,
            name = platform.name,
            total,
            courtesy_ms = courtesy_delay.as_millis() as u64,
            "access check started"
        );

        for (index, record) in input.records.into_iter().enumerate() {
            let result = engine.classify(&mut *fetcher, &record.url).await;
            let classified = ClassificationRecord {
                input: record,
                verdict: result.verdict,
                secondary: result.secondary,
            };
            output
                .append(&classified)
                .with_context(|| format!("failed to write {}", output_path.display()))?;

            tracing::info!(
                target: "app",
                effective = fetcher.current_url().unwrap_or("-"),
                "{} of {}, access = {}",
                index + 1,
                total,
                classified.verdict
            );
            summary.record(&classified.verdict);

            if result.fetches > 0 {
                pause.pause(courtesy_delay).await;
            }
        }

        summary.finish();
        Ok(summary)
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub platform: &'static str,
    pub total: usize,
    pub processed: usize,
    pub verdicts: BTreeMap<String, usize>,
    pub started_at: DateTime<Utc>,
}

impl RunSummary {
    fn start(platform: &'static str, total: usize) -> Self {
        Self {
            platform,
            total,
            processed: 0,
            verdicts: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }

    fn record(&mut self, verdict: &Verdict) {
        self.processed += 1;
        *self.verdicts.entry(verdict.to_string()).or_default() += 1;
    }

    fn finish(&self) {
        let elapsed = Utc::now() - self.started_at;
        tracing::info!(
            target: "app",
            platform = self.platform,
            processed = self.processed,
            total = self.total,
            elapsed_secs = elapsed.num_seconds(),
            "access check finished"
        );
        for (verdict, count) in &self.verdicts {
            tracing::info!(target: "app", count, "{verdict}");
        }
    }
}

pub fn list_platforms(json: bool) -> Result<()> {
    let summaries: Vec<_> = registry().iter().map(Platform::summary).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for summary in summaries {
        let mut line = format!("{:<6} {}", summary.code, summary.name);
        if !summary.aliases.is_empty() {
            line.push_str(&format!(" (also: {})", summary.aliases.join(", ")));
        }
        if !summary.navigation.is_empty() {
            line.push_str(&format!(" [{}]", summary.navigation.join(", ")));
        }
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, time::Duration};

    use super::*;
    use crate::{fetch::scripted::ScriptedFetcher, infrastructure::pause::RecordingPause};

    const SS_URL: &str =
        "http://ab1.search.serialssolutions.com/?V=1.0&L=AB1&S=JCs&C=TC0000042&T=marc";
    const SS_REWRITTEN: &str =
        "http://AB1.search.serialssolutions.com/?V=1.0&L=AB1&S=JCs&C=TC0000042&T=marc&tab=ALL";
    const FOREIGN_URL: &str = "http://example.org/journal?id=1";

    fn check_args(dir: &std::path::Path, platform: &str) -> CheckArgs {
        CheckArgs {
            platform: platform.to_string(),
            input: dir.join("in.csv"),
            output: dir.join("out.csv"),
            ebook_package: false,
            bom: false,
            delay_ms: Some(250),
        }
    }

    #[tokio::test]
    async fn each_record_is_appended_and_only_fetching_records_wait() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("in.csv"),
            format!("title,url\nJournal A,{SS_URL}\nJournal B,{FOREIGN_URL}\n"),
        )
        .unwrap();
        let args = check_args(dir.path(), "ss");
        let mut config = AppConfig::for_tests();
        args.apply(&mut config).unwrap();

        let mut fetcher = ScriptedFetcher::default().page(SS_REWRITTEN, "<div class=\"SS_Holding\">");
        let pause = RecordingPause::default();
        let summary = AccessCheckApp::initialize(config, &args)
            .unwrap()
            .run(&mut fetcher, &pause)
            .await
            .unwrap();

        assert_eq!(fetcher.calls, vec![SS_REWRITTEN.to_string()]);
        assert_eq!(*pause.waits.lock().unwrap(), vec![Duration::from_millis(250)]);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.verdicts.get("Full access"), Some(&1));

        let output = fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(
            output,
            format!(
                "title,url,access\nJournal A,{SS_URL},Full access\n\
                 Journal B,{FOREIGN_URL},This script is not configured to accept this URL structure.\n"
            )
        );
    }

    #[tokio::test]
    async fn resumed_run_appends_without_a_second_header() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in.csv"), format!("title,url\nJournal B,{FOREIGN_URL}\n")).unwrap();
        let args = check_args(dir.path(), "ss");

        for _ in 0..2 {
            let mut config = AppConfig::for_tests();
            args.apply(&mut config).unwrap();
            let mut fetcher = ScriptedFetcher::default();
            AccessCheckApp::initialize(config, &args)
                .unwrap()
                .run(&mut fetcher, &RecordingPause::default())
                .await
                .unwrap();
        }

        let output = fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(output.matches("title,url,access").count(), 1);
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn unknown_platform_fails_before_reading_input() {
        let dir = tempfile::tempdir().unwrap();
        let args = check_args(dir.path(), "nope");
        let err = AccessCheckApp::initialize(AppConfig::for_tests(), &args)
            .err()
            .unwrap();
        assert!(err.downcast_ref::<ConfigError>().is_some());
        assert!(!dir.path().join("out.csv").exists());
    }
}
