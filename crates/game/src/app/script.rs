use std::fs;
use std::path::{Path, PathBuf};

use cliff_engine::{InputAction, InputState};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read input script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse input script at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("input script step {step}: unknown action {token:?}")]
    UnknownAction { step: usize, token: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepFile {
    frames: u32,
    #[serde(default)]
    hold: Vec<String>,
    #[serde(default)]
    press: Vec<String>,
}

/// One span of host frames: `hold` stays down for the whole span, `press`
/// is tapped on its first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptStep {
    pub(crate) frames: u32,
    pub(crate) hold: Vec<InputAction>,
    pub(crate) press: Vec<InputAction>,
}

impl ScriptStep {
    fn new(frames: u32, hold: &[InputAction], press: &[InputAction]) -> Self {
        Self {
            frames,
            hold: hold.to_vec(),
            press: press.to_vec(),
        }
    }
}

/// Replays a fixed list of steps into an [`InputState`], one call per frame.
#[derive(Debug, Clone)]
pub(crate) struct InputScript {
    steps: Vec<ScriptStep>,
    step: usize,
    frame_in_step: u32,
}

impl InputScript {
    pub(crate) fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            step: 0,
            frame_in_step: 0,
        }
    }

    pub(crate) fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub(crate) fn from_json_str(raw: &str) -> Result<Self, ScriptError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let files: Vec<StepFile> =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                ScriptError::Parse {
                    path: error.path().to_string(),
                    message: error.into_inner().to_string(),
                }
            })?;

        let steps = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                Ok(ScriptStep {
                    frames: file.frames,
                    hold: parse_actions(index, &file.hold)?,
                    press: parse_actions(index, &file.press)?,
                })
            })
            .collect::<Result<Vec<_>, ScriptError>>()?;
        Ok(Self::new(steps))
    }

    /// Walks right through the built-in world: over the spike strip, across
    /// the gap and up the climbing wall.
    pub(crate) fn demo() -> Self {
        use InputAction::{Grab, Jump, Left, Right, Up};

        Self::new(vec![
            ScriptStep::new(20, &[], &[]),
            ScriptStep::new(40, &[Right], &[]),
            ScriptStep::new(30, &[Right, Jump], &[Jump]),
            ScriptStep::new(90, &[Right], &[]),
            ScriptStep::new(40, &[Right, Jump], &[Jump]),
            ScriptStep::new(60, &[Right, Grab, Up], &[]),
            ScriptStep::new(20, &[Left, Jump], &[Jump]),
            ScriptStep::new(60, &[], &[]),
        ])
    }

    pub(crate) fn total_frames(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.frames)).sum()
    }

    /// Sets `input` for the next frame. Returns false once every step ran.
    pub(crate) fn apply_frame(&mut self, input: &mut InputState) -> bool {
        while let Some(step) = self.steps.get(self.step) {
            if self.frame_in_step < step.frames {
                break;
            }
            self.step += 1;
            self.frame_in_step = 0;
        }
        let Some(step) = self.steps.get(self.step) else {
            input.release_all();
            return false;
        };

        if self.frame_in_step == 0 {
            for action in ALL_ACTIONS {
                if !step.hold.contains(&action) {
                    input.release(action);
                }
            }
            for &action in &step.press {
                input.release(action);
                input.press(action);
            }
        } else if self.frame_in_step == 1 {
            for &action in &step.press {
                if !step.hold.contains(&action) {
                    input.release(action);
                }
            }
        }
        for &action in &step.hold {
            input.press(action);
        }

        self.frame_in_step += 1;
        true
    }
}

const ALL_ACTIONS: [InputAction; 7] = [
    InputAction::Left,
    InputAction::Right,
    InputAction::Up,
    InputAction::Down,
    InputAction::Jump,
    InputAction::Grab,
    InputAction::Grapple,
];

fn parse_actions(step: usize, tokens: &[String]) -> Result<Vec<InputAction>, ScriptError> {
    tokens
        .iter()
        .map(|token| {
            InputAction::from_token(token).ok_or_else(|| ScriptError::UnknownAction {
                step,
                token: token.clone(),
            })
        })
        .collect()
}
