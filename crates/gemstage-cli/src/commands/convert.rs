//! Convert command implementation.

use super::GemArgs;
use crate::context::Context;
use crate::output;
use anyhow::{Context as _, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

/// Arguments for the convert command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub gem: GemArgs,

    /// Archive path; the compressed archive is written next to it with `.gz` appended
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory for the temporary staging root (defaults to a fresh temp dir)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Also write the normalized metadata as JSON to this file
    #[arg(long)]
    pub metadata_out: Option<PathBuf>,
}

/// Run the convert command.
pub async fn run(ctx: &Context, args: ConvertArgs) -> Result<()> {
    let constraint = args.gem.constraint()?;
    let scratch = tempfile::tempdir()?;
    let build_dir = args
        .build_dir
        .as_deref()
        .map_or_else(|| scratch.path().to_path_buf(), |dir| ctx.path(dir));
    let adapter = ctx.adapter(&ctx.working_dir)?;

    output::step(&format!("Converting {}", style(&args.gem.gem).yellow()));
    let conversion = adapter
        .convert(
            &ctx.identifier(&args.gem.gem),
            constraint.as_ref(),
            &ctx.path(&args.output),
            &build_dir,
        )
        .await?;

    if let Some(path) = &args.metadata_out {
        let path = ctx.path(path);
        std::fs::write(&path, conversion.metadata.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        output::field("metadata", path.display());
    }

    output::success(&format!(
        "{} {}",
        style(&conversion.metadata.name).green(),
        conversion.metadata.version
    ));
    output::field("depends", conversion.metadata.dependencies.join(", "));
    println!("{}", conversion.archive.display());
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use gemstage_config::AdapterConfig;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SPEC: &str = "--- !ruby/object:Gem::Specification
name: demo
version: !ruby/object:Gem::Version
  version: '1.0'
summary: Demo gem
";

    fn gem_bytes() -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SPEC.as_bytes()).unwrap();
        let metadata = encoder.finish().unwrap();

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(metadata.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "metadata.gz", metadata.as_slice())
            .unwrap();
        builder.into_inner().unwrap()
    }

    /// A `gem` stand-in that drops one file into `--install-dir`.
    fn fake_gem(dir: &Path) -> PathBuf {
        let script = dir.join("fake-gem");
        std::fs::write(&script, "#!/bin/sh\nmkdir -p \"$5\" && touch \"$5/demo.rb\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    fn context(working_dir: &Path, tools: &Path, source: Option<Url>) -> Context {
        let mut config = AdapterConfig {
            gem_program: fake_gem(tools),
            gem_dir: Some("/usr/lib/ruby/gems".into()),
            gem_bindir: Some("/usr/bin".into()),
            ..AdapterConfig::default()
        };
        if let Some(source) = source {
            config.sources = vec![source];
        }
        Context {
            working_dir: working_dir.to_path_buf(),
            config,
        }
    }

    fn args(gem: &str) -> ConvertArgs {
        ConvertArgs {
            gem: GemArgs {
                gem: gem.into(),
                constraint: None,
            },
            output: PathBuf::from("data.tar"),
            build_dir: None,
            metadata_out: Some(PathBuf::from("metadata.json")),
        }
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn downloaded_gem_stays_in_working_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/versions/demo.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"number": "1.0", "platform": "ruby", "prerelease": false}]"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gems/demo-1.0.gem"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gem_bytes()))
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let source = Url::parse(&format!("{}/", server.uri())).unwrap();
        let ctx = context(work.path(), tools.path(), Some(source));

        run(&ctx, args("demo")).await.unwrap();

        assert_eq!(
            listing(work.path()),
            vec!["data.tar.gz", "demo-1.0.gem", "metadata.json"]
        );
    }

    #[tokio::test]
    async fn relative_gem_path_uses_working_dir() {
        let work = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        std::fs::write(work.path().join("demo-1.0.gem"), gem_bytes()).unwrap();
        let ctx = context(work.path(), tools.path(), None);

        run(&ctx, args("demo-1.0.gem")).await.unwrap();

        let metadata = std::fs::read_to_string(work.path().join("metadata.json")).unwrap();
        assert!(metadata.contains("rubygem-demo"));
        assert!(work.path().join("data.tar.gz").is_file());
    }
}
