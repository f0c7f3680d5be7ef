// tests/pipeline_integration.rs

//! End-to-end pipeline runs against a fake toolchain in a temp checkout.
//!
//! The fake `tools/gn` and `tools/ninja` are tiny shell scripts, so these
//! tests are unix-only.

#![cfg(unix)]

mod common;

use std::error::Error;
use std::fs;

use buildrunner::config::Build;
use buildrunner::events::RunnerEvent;
use buildrunner::pipeline::{Pipeline, PipelineOptions, PipelineState};
use buildrunner_test_utils::builders::{BuildBuilder, GeneratorTaskBuilder, TestTaskBuilder};
use buildrunner_test_utils::collector::{collecting_handler, event_summary};
use buildrunner_test_utils::{init_tracing, with_timeout};

use common::{linux_host, write_script};

type TestResult = Result<(), Box<dyn Error>>;

fn build_with_targets() -> Build {
    BuildBuilder::new("host_debug")
        .gn_arg("--runtime-mode=debug")
        .ninja_target("everything")
        .build()
}

#[tokio::test]
async fn successful_pipeline_runs_all_stages() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let checkout = dir.path();
        write_script(checkout, "tools/gn", "#!/bin/sh\necho gn ok\nexit 0\n");
        write_script(checkout, "tools/ninja", "#!/bin/sh\necho built\nexit 0\n");
        write_script(checkout, "gen/docs.sh", "#!/bin/sh\nexit 0\n");
        write_script(checkout, "t/pass.sh", "#!/bin/sh\necho test output\nexit 0\n");

        let build = BuildBuilder::new("host_debug")
            .generator(
                GeneratorTaskBuilder::new("docs")
                    .language("bash")
                    .script("gen/docs.sh")
                    .build(),
            )
            .test(
                TestTaskBuilder::new("pass", "t/pass.sh")
                    .language("bash")
                    .build(),
            )
            .build();

        let (handler, collected) = collecting_handler();
        let mut pipeline = Pipeline::new(
            linux_host(),
            checkout.to_path_buf(),
            build,
            PipelineOptions::default(),
        )?;

        assert!(pipeline.run(&handler).await?);
        assert_eq!(pipeline.state(), PipelineState::Done);

        let events = collected.lock().unwrap();
        let summary = event_summary(&events);
        let names: Vec<&str> = summary.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["gn", "gn", "ninja", "ninja", "docs", "docs", "pass", "pass"]
        );
        Ok(())
    })
    .await
}

#[tokio::test]
async fn ninja_progress_lines_become_progress_events() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let checkout = dir.path();
        write_script(
            checkout,
            "tools/ninja",
            "#!/bin/sh\n\
             echo '[1/2] CXX foo.o'\n\
             echo 'foo.cc:10:5: error: something odd'\n\
             echo '[2/2] LINK bar'\n\
             exit 0\n",
        );

        let options = PipelineOptions {
            run_gn: false,
            run_generators: false,
            run_tests: false,
            ..Default::default()
        };

        let (handler, collected) = collecting_handler();
        let mut pipeline =
            Pipeline::new(linux_host(), checkout.to_path_buf(), build_with_targets(), options)?;
        assert!(pipeline.run(&handler).await?);

        let events = collected.lock().unwrap();

        let progress: Vec<(u64, u64, String)> = events
            .iter()
            .filter_map(|event| match event {
                RunnerEvent::Progress(p) => Some((p.completed, p.total, p.what.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            progress,
            vec![
                (1, 2, "CXX foo.o".to_string()),
                (2, 2, "LINK bar".to_string())
            ]
        );

        // Progress lines are consumed; the diagnostic line is ordinary
        // captured output.
        let result = events
            .iter()
            .find_map(|event| match event {
                RunnerEvent::Result(r) if r.name == "ninja" => Some(r.clone()),
                _ => None,
            })
            .expect("ninja result event");
        assert!(!result.artifacts.stdout.contains("[1/2]"));
        assert!(!result.artifacts.stdout.contains("[2/2]"));
        assert!(result.artifacts.stdout.contains("foo.cc:10:5: error: something odd"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn failing_ninja_result_carries_stderr() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let checkout = dir.path();
        write_script(
            checkout,
            "tools/ninja",
            "#!/bin/sh\necho 'ninja: build stopped' >&2\nexit 1\n",
        );

        let options = PipelineOptions {
            run_gn: false,
            run_generators: false,
            run_tests: false,
            ..Default::default()
        };

        let (handler, collected) = collecting_handler();
        let mut pipeline =
            Pipeline::new(linux_host(), checkout.to_path_buf(), build_with_targets(), options)?;
        assert!(!pipeline.run(&handler).await?);
        assert_eq!(pipeline.state(), PipelineState::Failed);

        let events = collected.lock().unwrap();
        let result = events
            .iter()
            .find_map(|event| match event {
                RunnerEvent::Result(r) => Some(r.clone()),
                _ => None,
            })
            .expect("ninja result event");
        assert_eq!(result.artifacts.exit_code, 1);
        assert!(result.artifacts.stderr.contains("ninja: build stopped"));
        assert!(result.to_string().contains("FAILED"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn gn_success_triggers_compile_commands_fixup() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempfile::tempdir()?;
        let checkout = dir.path();
        write_script(checkout, "tools/gn", "#!/bin/sh\nexit 0\n");

        let artifact = checkout.join("out/host_debug/compile_commands.json");
        fs::create_dir_all(artifact.parent().unwrap())?;
        fs::write(
            &artifact,
            r#"[{"file": "foo.cc", "command": "ccache /bin/clang++ -c foo.cc"}]"#,
        )?;

        let options = PipelineOptions {
            run_ninja: false,
            run_generators: false,
            run_tests: false,
            ..Default::default()
        };

        let (handler, _collected) = collecting_handler();
        let mut pipeline =
            Pipeline::new(linux_host(), checkout.to_path_buf(), build_with_targets(), options)?;
        assert!(pipeline.run(&handler).await?);

        let contents = fs::read_to_string(&artifact)?;
        assert!(contents.contains(r#""command": "/bin/clang++ -c foo.cc""#));
        assert!(!contents.contains("ccache"));
        Ok(())
    })
    .await
}
