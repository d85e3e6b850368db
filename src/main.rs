//! PromptForge's main application entry point and orchestration logic.
//! Handles command-line argument parsing and coordinates interactions
//! between the composition core, the record store and the backends.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use serde_json::Map;

use promptforge::{
    backend::{
        BackendRegistry, CancelToken, CompletionRequest, CompletionStream, ConnectorError,
        LlmBackend,
    },
    cli::{get_args, Args, Command},
    compose::{Composer, CompositionResult},
    config::{load_settings, Settings},
    csv_import::import_prompts,
    error::{default_error_handler, Error, Result},
    prompt, schema,
    storage::{ExecutionStatus, HistoryEntry, PromptRecord, Store},
    template::MiniJinjaRenderer,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Off
        })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args.config_dir)?;
    let composer = Composer::new(MiniJinjaRenderer::with_user_label(&settings.user_label));

    match args.command {
        Command::Render { template, stdin, schema } => {
            run_render(&composer, &template, stdin, schema)
        }
        Command::Run {
            name,
            backend,
            model,
            system,
            temperature,
            max_tokens,
            no_stream,
            stdin,
        } => run_execute(
            &settings,
            &composer,
            &name,
            backend,
            model,
            system,
            temperature,
            max_tokens,
            no_stream,
            stdin,
        ),
        Command::Import { file, update } => run_import(&settings, &composer, &file, update),
        Command::List { category, tag, favorites } => {
            run_list(&settings, category, tag, favorites)
        }
        Command::Models { backend } => run_models(&settings, &backend),
        Command::Probe { backend } => run_probe(&settings, &backend),
    }
}

fn run_render(
    composer: &Composer,
    template_path: &PathBuf,
    stdin: bool,
    schema_path: Option<PathBuf>,
) -> Result<()> {
    let template = std::fs::read_to_string(template_path)?;

    let fields = match schema_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let fields = schema::schema_from_json(Some(&content))
                .ok_or_else(|| Error::ConfigError("schema file is not valid JSON".to_string()))?;
            let problems = schema::validate_schema(&fields);
            if !problems.is_empty() {
                return Err(Error::ValidationError(problems.join("; ")));
            }
            fields
        }
        None => schema::auto_schema(&composer.engine().extract_placeholders(&template)),
    };

    let values = if stdin {
        prompt::values_from_stdin()?
    } else if fields.is_empty() {
        Map::new()
    } else {
        prompt::collect_values(&fields)?
    };

    let result = composer.compose(&template, &values, Some(&fields));
    if result.is_blocked() {
        return report_blocked(&result);
    }
    println!("{}", result.rendered);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_execute(
    settings: &Settings,
    composer: &Composer,
    name: &str,
    backend_name: Option<String>,
    model: Option<String>,
    system: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    no_stream: bool,
    stdin: bool,
) -> Result<()> {
    let mut store = Store::open(&settings.store_path)?;
    let record: PromptRecord = store
        .find_by_name(name)
        .cloned()
        .ok_or_else(|| Error::StorageError(format!("no prompt named '{}'", name)))?;

    // The schema follows the template text: stored fields are reconciled
    // against the placeholders currently present.
    let placeholders = composer.engine().extract_placeholders(&record.content);
    let fields = match record.schema() {
        Some(fields) => schema::reconcile_schema(&fields, &placeholders),
        None => schema::auto_schema(&placeholders),
    };

    let values = if stdin {
        prompt::values_from_stdin()?
    } else if fields.is_empty() {
        Map::new()
    } else {
        prompt::collect_values(&fields)?
    };

    let composed = composer.compose(&record.content, &values, Some(&fields));
    if composed.is_blocked() {
        return report_blocked(&composed);
    }

    let registry = BackendRegistry::from_settings(settings)?;
    let backend_name = backend_name
        .or_else(|| settings.default_backend.clone())
        .unwrap_or_else(|| "openai".to_string());
    let backend = registry
        .get(&backend_name)
        .ok_or_else(|| ConnectorError::UnknownBackend(backend_name.clone()))?;
    let model = match model {
        Some(model) => model,
        None => default_model(settings, backend)?,
    };

    let request = CompletionRequest {
        system,
        prompt: composed.rendered.clone(),
        model: model.clone(),
        temperature,
        max_tokens,
        stream: !no_stream,
    };
    let cancel = CancelToken::new();
    let started = Instant::now();

    let (response_text, status, failure) = match backend.complete(&request, &cancel) {
        Ok(chunks) => stream_to_stdout(chunks),
        Err(err) => (String::new(), ExecutionStatus::Failed, Some(err)),
    };

    store.add_history(HistoryEntry::new(
        Some(record.id),
        backend_name,
        model,
        serde_json::to_string(&request)?,
        response_text,
        started.elapsed().as_millis() as u64,
        status,
    ));
    store.save()?;

    if status == ExecutionStatus::Stopped {
        eprintln!("stopped");
    }
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Prints chunks as they arrive and collects them into the response text.
fn stream_to_stdout(chunks: CompletionStream) -> (String, ExecutionStatus, Option<ConnectorError>) {
    let mut response = String::new();
    for chunk in chunks {
        match chunk {
            Ok(text) => {
                print!("{}", text);
                let _ = std::io::stdout().flush();
                response.push_str(&text);
            }
            Err(ConnectorError::Stopped) => {
                println!();
                return (response, ExecutionStatus::Stopped, None);
            }
            Err(err) => {
                println!();
                return (response, ExecutionStatus::Failed, Some(err));
            }
        }
    }
    println!();
    (response, ExecutionStatus::Completed, None)
}

/// Picks a model when the caller names none.
fn default_model(settings: &Settings, backend: &dyn LlmBackend) -> Result<String> {
    match backend.name() {
        "openai" | "lmstudio" => Ok(settings.openai_model.clone()),
        _ => {
            let models = backend.list_models()?;
            models.into_iter().next().ok_or_else(|| {
                Error::ConnectorError(ConnectorError::Response(
                    "no models available".to_string(),
                ))
            })
        }
    }
}

fn report_blocked(result: &CompositionResult) -> Result<()> {
    for name in &result.missing_required {
        eprintln!("Missing required value: {}", name);
    }
    for error in &result.errors {
        eprintln!("{}", error);
    }
    Err(Error::ValidationError("prompt composition failed".to_string()))
}

fn run_import(
    settings: &Settings,
    composer: &Composer,
    file: &PathBuf,
    update: bool,
) -> Result<()> {
    let mut store = Store::open(&settings.store_path)?;
    let stats = import_prompts(&mut store, composer.engine(), file, update)?;
    println!(
        "Imported: {} created, {} updated, {} skipped, {} errors.",
        stats.created, stats.updated, stats.skipped, stats.errors
    );
    Ok(())
}

fn run_list(
    settings: &Settings,
    category: Option<String>,
    tag: Option<String>,
    favorites: bool,
) -> Result<()> {
    let store = Store::open(&settings.store_path)?;
    let records: Vec<&PromptRecord> = if let Some(category) = &category {
        store.by_category(category)
    } else if let Some(tag) = &tag {
        store.by_tag(tag)
    } else if favorites {
        store.favorites()
    } else {
        store.prompts().iter().collect()
    };

    for record in records {
        let marker = if record.is_favorite { "*" } else { " " };
        let category = record.category.as_deref().unwrap_or("-");
        println!("{} {}  [{}]  {}", marker, record.name, category, record.tags.join(","));
    }
    Ok(())
}

fn run_models(settings: &Settings, backend_name: &str) -> Result<()> {
    let registry = BackendRegistry::from_settings(settings)?;
    let backend = registry
        .get(backend_name)
        .ok_or_else(|| ConnectorError::UnknownBackend(backend_name.to_string()))?;
    for model in backend.list_models()? {
        println!("{}", model);
    }
    Ok(())
}

fn run_probe(settings: &Settings, backend_name: &str) -> Result<()> {
    let registry = BackendRegistry::from_settings(settings)?;
    let probe = registry.probe(backend_name, "Hello");
    if probe.success {
        println!(
            "Backend '{}' responded in {} ms ({} models).",
            backend_name,
            probe.duration_ms,
            probe.models.len()
        );
        println!("{}", probe.response);
        Ok(())
    } else {
        Err(Error::ConfigError(format!(
            "backend '{}' probe failed: {}",
            backend_name,
            probe.error.unwrap_or_else(|| "unknown failure".to_string())
        )))
    }
}
