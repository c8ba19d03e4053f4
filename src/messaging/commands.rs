//! Scheduler commands
//!
//! Commands represent requests to perform actions (imperative).
//! They are applied on the thread that owns the scheduler.
use std::time::Duration;

use crate::audio_system::{
    ChannelId, ChannelPool, PlaybackRequest, SoundCategory, SoundScheduler, SoundSelector,
    SoundTarget,
};

/// Operations a host can queue for the scheduler
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    Play(PlaybackRequest),
    Stop(SoundSelector),
    StopAll,
    StopAfter {
        selector: SoundSelector,
        delay: Duration,
    },
    FadeOut {
        selector: SoundSelector,
        duration: Duration,
    },
    Pause(SoundCategory),
    Resume(SoundCategory),
    PauseAll,
    ResumeAll,
    SetEnabled {
        category: SoundCategory,
        enabled: bool,
    },
    SetVolume {
        category: SoundCategory,
        volume: f32,
    },
    SetParentGroup(Option<String>),
    DestroyAll,
    LogStatus,

    /// Stop the driver loop
    Shutdown,
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Command applied
    Success,

    /// Play request started on a channel
    Started(ChannelId),

    /// Play request was scheduled or dropped
    NotStarted,

    /// Driver should exit
    Shutdown,
}

impl SchedulerCommand {
    /// Apply to a scheduler
    pub fn apply<P: ChannelPool>(self, scheduler: &mut SoundScheduler<P>) -> CommandResult {
        tracing::trace!("Applying command: {}", self.description());

        match self {
            SchedulerCommand::Play(request) => match scheduler.request_play(request) {
                Some(channel) => CommandResult::Started(channel),
                None => CommandResult::NotStarted,
            },
            SchedulerCommand::Stop(selector) => {
                scheduler.stop(selector);
                CommandResult::Success
            }
            SchedulerCommand::StopAll => {
                scheduler.stop_all();
                CommandResult::Success
            }
            SchedulerCommand::StopAfter { selector, delay } => {
                scheduler.stop_after(selector, delay);
                CommandResult::Success
            }
            SchedulerCommand::FadeOut { selector, duration } => {
                scheduler.fade_out(selector, duration);
                CommandResult::Success
            }
            SchedulerCommand::Pause(category) => {
                scheduler.pause(category);
                CommandResult::Success
            }
            SchedulerCommand::Resume(category) => {
                scheduler.resume(category);
                CommandResult::Success
            }
            SchedulerCommand::PauseAll => {
                scheduler.pause_all();
                CommandResult::Success
            }
            SchedulerCommand::ResumeAll => {
                scheduler.resume_all();
                CommandResult::Success
            }
            SchedulerCommand::SetEnabled { category, enabled } => {
                scheduler.set_enabled(category, enabled);
                CommandResult::Success
            }
            SchedulerCommand::SetVolume { category, volume } => {
                scheduler.set_volume(category, volume);
                CommandResult::Success
            }
            SchedulerCommand::SetParentGroup(parent) => {
                scheduler.set_parent_group(parent);
                CommandResult::Success
            }
            SchedulerCommand::DestroyAll => {
                scheduler.destroy_all();
                CommandResult::Success
            }
            SchedulerCommand::LogStatus => {
                scheduler.log_status();
                CommandResult::Success
            }
            SchedulerCommand::Shutdown => CommandResult::Shutdown,
        }
    }

    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            SchedulerCommand::Play(request) => match &request.target {
                SoundTarget::Id(id) => format!("Play {}", id),
                SoundTarget::Clip(clip) => format!("Play clip {}", clip),
            },
            SchedulerCommand::Stop(selector) => format!("Stop {:?}", selector),
            SchedulerCommand::StopAll => "Stop all".to_string(),
            SchedulerCommand::StopAfter { selector, delay } => {
                format!("Stop {:?} in {}ms", selector, delay.as_millis())
            }
            SchedulerCommand::FadeOut { selector, duration } => {
                format!("Fade out {:?} over {}ms", selector, duration.as_millis())
            }
            SchedulerCommand::Pause(category) => format!("Pause {}", category),
            SchedulerCommand::Resume(category) => format!("Resume {}", category),
            SchedulerCommand::PauseAll => "Pause all".to_string(),
            SchedulerCommand::ResumeAll => "Resume all".to_string(),
            SchedulerCommand::SetEnabled { category, enabled } => {
                format!("Set {} enabled={}", category, enabled)
            }
            SchedulerCommand::SetVolume { category, volume } => {
                format!("Set {} volume={:.2}", category, volume)
            }
            SchedulerCommand::SetParentGroup(parent) => format!("Set parent group {:?}", parent),
            SchedulerCommand::DestroyAll => "Destroy all".to_string(),
            SchedulerCommand::LogStatus => "Log status".to_string(),
            SchedulerCommand::Shutdown => "Shutdown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_description() {
        let cmd = SchedulerCommand::Play(PlaybackRequest::id("theme"));
        assert_eq!(cmd.description(), "Play theme");

        let cmd = SchedulerCommand::Pause(SoundCategory::Music);
        assert_eq!(cmd.description(), "Pause Music");

        let cmd = SchedulerCommand::StopAfter {
            selector: SoundSelector::from("engine"),
            delay: Duration::from_millis(1500),
        };
        assert_eq!(cmd.description(), "Stop Id(\"engine\") in 1500ms");

        let cmd = SchedulerCommand::Shutdown;
        assert_eq!(cmd.description(), "Shutdown");
    }
}
