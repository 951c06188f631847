//! Replay a recorded input script through the editor core and print the
//! resulting layer contents as JSON.
//!
//! Usage: `gridink-replay <script.json>` (reads stdin without an argument).

use gridink_core::{
    Editor, GridBounds, KeyEvent, LayerStorage, Modifiers, PointerEvent, PuzzleObject, Settings,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::time::{Duration, Instant};

/// A recorded editing session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Script {
    bounds: GridBounds,
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Step {
    Layer(String),
    Modifiers(Modifiers),
    Pointer(PointerEvent),
    /// Key press `ms` milliseconds after the script started.
    Key { key: String, ms: u64 },
    Undo,
    Redo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    layers: BTreeMap<String, LayerStorage<PuzzleObject>>,
    history_index: usize,
    history_len: usize,
}

fn replay(script: Script) -> Result<Report, Box<dyn std::error::Error>> {
    let mut editor = Editor::new(script.bounds, script.settings);
    let started = Instant::now();
    for (i, step) in script.steps.into_iter().enumerate() {
        match step {
            Step::Layer(id) => {
                if !editor.set_current_layer(&id) {
                    log::warn!("step {i}: unknown layer {id:?}");
                }
            }
            Step::Modifiers(modifiers) => editor.set_modifiers(modifiers),
            Step::Pointer(event) => {
                let action = editor.handle_pointer(&event)?;
                log::debug!("step {i}: {:?} -> {}", event.phase, action.tag());
            }
            Step::Key { key, ms } => {
                let at = started + Duration::from_millis(ms);
                let recorded = editor.handle_key(&KeyEvent::Pressed(key), at)?;
                log::debug!("step {i}: key recorded {} actions", recorded.len());
            }
            Step::Undo => {
                let undone = editor.undo();
                log::debug!("step {i}: undid {} actions", undone.len());
            }
            Step::Redo => {
                let redone = editor.redo();
                log::debug!("step {i}: redid {} actions", redone.len());
            }
        }
    }

    let layers = editor
        .layers()
        .iter()
        .filter_map(|layer| {
            let storage = editor.storage(layer.id())?;
            Some((layer.id().to_string(), storage.clone()))
        })
        .collect();
    let history = editor.history().history(gridink_core::DEFAULT_GRID_ID);
    Ok(Report {
        layers,
        history_index: history.map_or(0, |h| h.index()),
        history_len: history.map_or(0, |h| h.len()),
    })
}

fn read_script() -> Result<Script, Box<dyn std::error::Error>> {
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("Starting GridInk replay");

    let script = read_script()?;
    log::info!("replaying {} steps", script.steps.len());
    let report = replay(script)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
