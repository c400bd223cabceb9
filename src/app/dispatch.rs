use crate::app::render;
use crate::app::status::{collect, render_status};
use crate::app::style::{dim, success, value};
use crate::cli::commands::{Cli, Commands, ProfileCommands};
use anyhow::{Context, Result};
use brandvoice::backends::build_chain;
use brandvoice::persistence::{Persistence, SqlitePersistence};
use brandvoice::style::{CandidateStatus, Category, RuleId, StyleProfile};
use brandvoice::{Config, Engine};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_category(raw: Option<&str>) -> Result<Option<Category>> {
    raw.map(str::parse::<Category>).transpose().map_err(Into::into)
}

async fn init(config: &Config, profile_path: Option<&Path>, json: bool) -> Result<()> {
    let initial = profile_path
        .map(|path| -> Result<StyleProfile> {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read style profile {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parse style profile {}", path.display()))
        })
        .transpose()?;

    let persistence = SqlitePersistence::open_with(&config.database_path(), config.storage.max_connections)
        .await
        .context("open brandvoice store")?;
    let persistence: Arc<dyn Persistence> = Arc::new(persistence);
    let existed = persistence.load_profile().await?.is_some();
    let engine = Engine::bootstrap(config, persistence, build_chain(config), initial).await?;
    let profile = engine.profile();

    if json {
        return print_json(&serde_json::json!({
            "workspace": config.workspace_dir,
            "database": config.database_path(),
            "profile_version": profile.version,
            "created": !existed,
        }));
    }
    if existed {
        println!(
            "{} already initialized {}",
            dim("·"),
            dim(format!("(profile v{} in {})", profile.version, config.database_path().display()))
        );
    } else {
        println!(
            "{} initialized {} for {}",
            success("✓"),
            value(config.database_path().display()),
            value(&profile.company_name)
        );
    }
    Ok(())
}

#[allow(clippy::too_many_lines)]
async fn run(engine: &Engine, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Init { .. } | Commands::Status => {
            anyhow::bail!("init and status are dispatched before the store is opened")
        }

        Commands::Generate {
            instruction,
            category,
            options,
        } => {
            let category: Category = category.parse()?;
            let artifacts = match options {
                Some(n) => {
                    engine
                        .orchestrator()
                        .generate_options(&instruction, category, n)
                        .await?
                }
                None => vec![engine.orchestrator().generate(&instruction, category).await?],
            };
            if json {
                return print_json(&artifacts);
            }
            for artifact in &artifacts {
                println!("{}", render::artifact(artifact));
            }
        }

        Commands::Correct {
            text,
            category,
            artifact,
        } => {
            let produced = match (artifact, text) {
                (Some(source_id), _) => engine.orchestrator().correct_artifact(&source_id).await?,
                (None, Some(text)) => {
                    let category = category.context("--category is required with a draft")?;
                    engine.orchestrator().correct_named(&text, &category).await?
                }
                (None, None) => anyhow::bail!("pass a draft text or --artifact <id>"),
            };
            if json {
                return print_json(&produced);
            }
            println!("{}", render::artifact(&produced));
        }

        Commands::Feedback {
            artifact_id,
            rating,
            comment,
        } => {
            let event = engine
                .feedback()
                .record_feedback(&artifact_id, rating, comment.as_deref())
                .await?;
            if json {
                return print_json(&event);
            }
            println!("{} feedback recorded {}", success("✓"), dim(&event.event_id));
        }

        Commands::History {
            category,
            limit,
            artifact,
        } => {
            let events = match artifact {
                Some(artifact_id) => engine.feedback().events_for(&artifact_id).await?,
                None => {
                    let category = parse_category(category.as_deref())?;
                    engine.feedback().recent(category, limit).await?
                }
            };
            if json {
                return print_json(&events);
            }
            if events.is_empty() {
                println!("{} no feedback yet", dim("·"));
            }
            for event in &events {
                println!("{}", render::event(event));
            }
        }

        Commands::Learn => {
            let update = engine.learning().learn_pending(engine.feedback()).await?;
            if json {
                return print_json(&serde_json::json!({
                    "profile_version": update.profile.version,
                    "report": update.report,
                }));
            }
            println!("{}", render::report(&update.report, update.profile.version));
        }

        Commands::Candidates { all } => {
            let profile = engine.profile();
            let candidates: Vec<_> = profile
                .ledger
                .candidates
                .values()
                .filter(|candidate| all || candidate.status == CandidateStatus::Staged)
                .collect();
            if json {
                return print_json(&candidates);
            }
            if candidates.is_empty() {
                println!("{} no candidates", dim("·"));
            }
            for candidate in candidates {
                println!("{}", render::candidate(candidate));
            }
        }

        Commands::Confirm { candidate_id, term } => {
            let profile = engine
                .learning()
                .confirm_candidate(&engine.profile(), &candidate_id, term.as_deref())
                .await?;
            if json {
                return print_json(&serde_json::json!({ "profile_version": profile.version }));
            }
            println!(
                "{} {candidate_id} confirmed {}",
                success("✓"),
                dim(format!("(profile v{})", profile.version))
            );
        }

        Commands::Reject { candidate_id } => {
            let profile = engine
                .learning()
                .reject_candidate(&engine.profile(), &candidate_id)
                .await?;
            if json {
                return print_json(&serde_json::json!({ "profile_version": profile.version }));
            }
            println!(
                "{} {candidate_id} rejected {}",
                success("✓"),
                dim(format!("(profile v{})", profile.version))
            );
        }

        Commands::Rules { inactive } => {
            let profile = engine.profile();
            let rules: Vec<_> = profile
                .declared_rules()
                .into_iter()
                .filter(|(_, state)| !inactive || state.is_some_and(|s| !s.active))
                .collect();
            if json {
                let rows: Vec<_> = rules
                    .iter()
                    .map(|(id, state)| serde_json::json!({ "rule_id": id, "state": state }))
                    .collect();
                return print_json(&rows);
            }
            for (id, state) in &rules {
                println!("{}", render::rule(id, *state));
            }
        }

        Commands::Reactivate { rule_id } => {
            let rule_id: RuleId = rule_id.parse()?;
            let profile = engine
                .learning()
                .reactivate_rule(&engine.profile(), &rule_id)
                .await?;
            if json {
                return print_json(&serde_json::json!({ "profile_version": profile.version }));
            }
            println!(
                "{} {rule_id} reactivated {}",
                success("✓"),
                dim(format!("(profile v{})", profile.version))
            );
        }

        Commands::Profile { profile_command } => match profile_command {
            ProfileCommands::Export { output } => {
                let rendered = serde_json::to_string_pretty(&*engine.profile())?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, rendered)
                            .with_context(|| format!("write {}", path.display()))?;
                        if !json {
                            println!("{} profile written to {}", success("✓"), value(path.display()));
                        }
                    }
                    None => println!("{rendered}"),
                }
            }
            ProfileCommands::Versions => {
                let versions = engine.persistence().profile_versions().await?;
                if json {
                    return print_json(&versions);
                }
                for (version, saved_at) in versions {
                    println!("v{version:<4} {}", dim(saved_at.to_rfc3339()));
                }
            }
        },
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, mut config: Config) -> Result<()> {
    if let Some(backend) = cli.backend {
        config.preferred_backend = Some(backend);
        config.validate()?;
    }

    match cli.command {
        Commands::Init { profile } => init(&config, profile.as_deref(), cli.json).await,
        Commands::Status => {
            let engine = Engine::open(&config).await.context("open brandvoice store")?;
            let report = collect(&config, &engine).await?;
            if cli.json {
                return print_json(&report);
            }
            println!("{}", render_status(&report));
            Ok(())
        }
        command => {
            let engine = Engine::open(&config).await.context("open brandvoice store")?;
            run(&engine, command, cli.json).await
        }
    }
}
