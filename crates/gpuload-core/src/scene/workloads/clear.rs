use crate::scene::{Scene, SceneState};

/// Measures the bare clear/present cycle: draws nothing.
pub struct ClearScene {
    state: SceneState,
}

impl ClearScene {
    pub fn new() -> Self {
        Self {
            state: SceneState::new("clear"),
        }
    }
}

impl Default for ClearScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for ClearScene {
    fn state(&self) -> &SceneState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }
}
