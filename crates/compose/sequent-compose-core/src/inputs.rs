//! Input contracts for the core engine.
//!
//! Per-instance drive commands applied at the step boundary, before timers
//! advance. Commands address the instance's root timer; nested timers are
//! driven only through their parent clip.

use serde::{Deserialize, Serialize};

use crate::ids::InstanceId;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    #[serde(default)]
    pub commands: Vec<DriveCommand>,
}

impl Inputs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn one(cmd: DriveCommand) -> Self {
        Self {
            commands: vec![cmd],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DriveCommand {
    SetActive {
        instance: InstanceId,
        active: bool,
    },
    Seek {
        instance: InstanceId,
        time: f32,
    },
    SetTimeScale {
        instance: InstanceId,
        time_scale: f32,
    },
}
