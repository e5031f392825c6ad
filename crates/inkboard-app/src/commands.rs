//! Subcommand implementations.

use crate::cli::{Cli, Command};
use crate::error::{AppError, AppResult};
use inkboard_core::canvas::CanvasState;
use inkboard_core::config::StorageConfigPatch;
use inkboard_core::dialog::FileDialog;
use inkboard_core::editor::EditorSession;
use inkboard_core::shapes::ObjectType;
use inkboard_core::storage::{
    AutoSaveManager, FileSource, FileStorage, Persistence, SaveStatus, StorageError,
};
use inkboard_core::sync::{ResolutionStrategy, StateSource, SyncEngine, SyncOutcome};
use inkboard_core::tools::ToolSettings;
use kurbo::{Point, Size};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How long the watch loop sleeps between ticks.
const WATCH_TICK: Duration = Duration::from_millis(100);

/// Run one command to completion.
pub fn run(cli: Cli, dialog: &dyn FileDialog) -> AppResult<()> {
    pollster::block_on(dispatch(cli, dialog))
}

async fn dispatch(cli: Cli, dialog: &dyn FileDialog) -> AppResult<()> {
    // `new` does not touch the local store.
    if let Command::New { file } = &cli.command {
        return new_file(file).await;
    }

    let mut persistence = Persistence::new(open_store(cli.store.as_deref())?);
    match cli.command {
        Command::New { .. } => Ok(()),
        Command::Add {
            kind,
            x,
            y,
            width,
            height,
        } => add(&mut persistence, &kind, x, y, Size::new(width, height)).await,
        Command::Show { json } => show(&persistence, json).await,
        Command::History => history(&persistence).await,
        Command::RestoreBackup => restore_backup(&mut persistence).await,
        Command::Export { out_dir } => export(&persistence, out_dir, dialog).await,
        Command::Import { file } => import(&mut persistence, file, dialog).await,
        Command::Config {
            auto_save_secs,
            max_history,
            backup,
        } => {
            let patch = StorageConfigPatch {
                auto_save_interval: None,
                max_history_count: max_history,
                backup_enabled: backup,
            };
            let patch = match auto_save_secs {
                Some(secs) => patch.auto_save_secs(secs),
                None => patch,
            };
            config(&mut persistence, patch).await
        }
        Command::Watch {
            file,
            view,
            strategy,
            interval_ms,
            max_polls,
        } => {
            let strategy = strategy
                .as_deref()
                .map(str::parse::<ResolutionStrategy>)
                .transpose()?;
            let options = WatchOptions {
                view,
                strategy,
                interval: Duration::from_millis(interval_ms),
                max_polls,
            };
            watch(persistence, &file, options).await
        }
    }
}

fn open_store(dir: Option<&Path>) -> AppResult<Arc<FileStorage>> {
    let storage = match dir {
        Some(dir) => FileStorage::new(dir.to_path_buf())?,
        None => FileStorage::default_location()?,
    };
    log::debug!("Using store {}", storage.base_path().display());
    Ok(Arc::new(storage))
}

async fn save(persistence: &mut Persistence<FileStorage>, state: &CanvasState) -> AppResult<()> {
    match persistence.save(state).await {
        SaveStatus::Error(message) => Err(AppError::Save(message)),
        _ => Ok(()),
    }
}

async fn new_file(file: &Path) -> AppResult<()> {
    let source = FileSource::new(file);
    source.write(&CanvasState::new()).await?;
    println!("Created {}", source.describe());
    Ok(())
}

async fn add(
    persistence: &mut Persistence<FileStorage>,
    kind: &str,
    x: Option<f64>,
    y: Option<f64>,
    size: Size,
) -> AppResult<()> {
    let state = persistence.load().await.unwrap_or_default();
    let center = state.canvas.center();
    let position = Point::new(x.unwrap_or(center.x), y.unwrap_or(center.y));

    let mut session = EditorSession::new(state, ToolSettings::default());
    let id = session.add_object_at(ObjectType::from(kind), position, size)?;
    save(persistence, session.state()).await?;

    if let Some(object) = session.state().object(&id) {
        println!(
            "Added {} {} at ({}, {}) size {}x{}",
            object.object_type(),
            object.id,
            object.position.x,
            object.position.y,
            object.size.width,
            object.size.height
        );
    }
    Ok(())
}

async fn show(persistence: &Persistence<FileStorage>, json: bool) -> AppResult<()> {
    let state = persistence.load().await.ok_or(AppError::NoState)?;
    if json {
        println!("{}", state.to_json_pretty().map_err(StorageError::from)?);
        return Ok(());
    }

    println!(
        "Canvas {}x{} grid {} (modified {})",
        state.canvas.width, state.canvas.height, state.canvas.grid_size, state.last_modified
    );
    for object in state.objects_ordered() {
        println!(
            "  {:<12} {} at ({}, {}) size {}x{} rot {} z {}",
            object.object_type().as_str(),
            object.id,
            object.position.x,
            object.position.y,
            object.size.width,
            object.size.height,
            object.rotation,
            object.z_index
        );
    }
    println!("  {} strokes, {} tool buttons", state.strokes.len(), state.tool_buttons.len());
    Ok(())
}

async fn history(persistence: &Persistence<FileStorage>) -> AppResult<()> {
    let entries = persistence.list_history().await;
    if entries.is_empty() {
        println!("No history");
    }
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}  {}  {} objects, {} strokes",
            i,
            entry.last_modified,
            entry.objects.len(),
            entry.strokes.len()
        );
    }
    Ok(())
}

async fn restore_backup(persistence: &mut Persistence<FileStorage>) -> AppResult<()> {
    let backup = persistence.backup().await.ok_or(AppError::NoBackup)?;
    save(persistence, &backup.state).await?;
    println!("Restored backup from {}", backup.timestamp);
    Ok(())
}

async fn export(
    persistence: &Persistence<FileStorage>,
    out_dir: Option<PathBuf>,
    dialog: &dyn FileDialog,
) -> AppResult<()> {
    let state = persistence.load().await.ok_or(AppError::NoState)?;
    let Some(dir) = out_dir.or_else(|| dialog.pick_directory()) else {
        log::info!("Export cancelled");
        return Ok(());
    };
    let path = persistence
        .export_to_file(&state, &dir)
        .ok_or_else(|| AppError::Export(dir.display().to_string()))?;
    println!("Exported {}", path.display());
    Ok(())
}

async fn import(
    persistence: &mut Persistence<FileStorage>,
    file: Option<PathBuf>,
    dialog: &dyn FileDialog,
) -> AppResult<()> {
    let Some(file) = file.or_else(|| dialog.pick_open()) else {
        log::info!("Import cancelled");
        return Ok(());
    };
    let bytes = fs::read(&file)?;
    let state = persistence.import_from_file(&bytes)?;
    save(persistence, &state).await?;
    println!("Imported {} ({} objects)", file.display(), state.objects.len());
    Ok(())
}

async fn config(persistence: &mut Persistence<FileStorage>, patch: StorageConfigPatch) -> AppResult<()> {
    let config = if patch.is_empty() {
        persistence.config().await
    } else {
        persistence.update_config(patch).await
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&config).map_err(StorageError::from)?
    );
    Ok(())
}

struct WatchOptions {
    view: bool,
    strategy: Option<ResolutionStrategy>,
    interval: Duration,
    max_polls: Option<u64>,
}

async fn watch(persistence: Persistence<FileStorage>, file: &Path, options: WatchOptions) -> AppResult<()> {
    let mut autosave = AutoSaveManager::new(persistence);
    let initial = autosave.load_last().await.unwrap_or_default();
    let mut session = if options.view {
        EditorSession::read_only(initial)
    } else {
        EditorSession::new(initial, ToolSettings::default())
    };
    // A view window always follows the shared file.
    let strategy = options
        .strategy
        .or(options.view.then_some(ResolutionStrategy::Remote));

    let mut engine = SyncEngine::new(Arc::new(FileSource::new(file)));
    engine.set_interval(options.interval);
    engine.start();
    if !options.view {
        autosave.start().await;
        engine.publish(session.state()).await;
    }

    let mut polls = 0u64;
    loop {
        if engine.should_poll() {
            let local = session.state().clone();
            match engine.poll(&local).await {
                SyncOutcome::Applied(state) => {
                    if state != *local {
                        session.replace_state(state);
                    }
                }
                SyncOutcome::Conflict(conflict) => {
                    println!(
                        "Conflict: local has {} objects, {} has {}",
                        conflict.local_state.objects.len(),
                        engine.source().describe(),
                        conflict.remote_state.objects.len()
                    );
                    match strategy {
                        Some(strategy) => {
                            let resolved = engine.resolve(strategy)?;
                            session.replace_state(resolved);
                            println!("Resolved with '{}'", strategy);
                            if !options.view {
                                autosave.mark_dirty();
                                engine.publish(session.state()).await;
                            }
                        }
                        None => {
                            println!("Keeping local state; pass --strategy to resolve automatically");
                            engine.dismiss_conflict();
                        }
                    }
                }
                SyncOutcome::Error(message) => println!("Sync error: {}", message),
                SyncOutcome::Unchanged | SyncOutcome::Pending | SyncOutcome::Idle => {}
            }
            polls += 1;
        }

        if !options.view && autosave.maybe_save(session.state()).await {
            if let SaveStatus::Error(message) = autosave.last_status() {
                println!("Save failed: {}", message);
            }
        }

        if options.max_polls.is_some_and(|max| polls >= max) {
            break;
        }
        thread::sleep(WATCH_TICK.min(options.interval));
    }

    engine.stop();
    autosave.stop();
    if !options.view && autosave.is_dirty() {
        autosave.save(session.state()).await;
    }
    Ok(())
}
