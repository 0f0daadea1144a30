use notify_rust::{Notification, Urgency};
use tracing::debug;

use crate::timer::Phase;

/// Receives "phase X just ended" events. Implementations own availability and
/// permission handling; failures never reach the caller.
pub trait Notifier {
    fn phase_completed(&self, ended: Phase);
}

pub fn completion_message(ended: Phase) -> (&'static str, &'static str) {
    match ended {
        Phase::Work => ("Break Time! ☕", "Work session finished. Take a break."),
        Phase::Break => ("Back to Work! 🎯", "Break is over. Start your next session."),
    }
}

pub struct DesktopNotifier {
    pub desktop: bool,
    pub sound: bool,
}

impl Notifier for DesktopNotifier {
    fn phase_completed(&self, ended: Phase) {
        let (title, body) = completion_message(ended);

        if self.desktop {
            if let Err(err) = Notification::new()
                .summary(title)
                .body(body)
                .appname("flowstate")
                .icon("alarm-clock")
                .urgency(Urgency::Critical)
                .show()
            {
                debug!(%err, "desktop notification unavailable");
            }
        }

        if self.sound {
            play_sound();
        }
    }
}

fn play_sound() {
    std::thread::spawn(|| {
        for (cmd, file) in [
            ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
            ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
            ("aplay", "/usr/share/sounds/generic.wav"),
        ] {
            if std::path::Path::new(file).exists() {
                let _ = std::process::Command::new(cmd)
                    .arg(file)
                    .stdout(std::process::Stdio::null())
                    .stderr(std::process::Stdio::null())
                    .spawn();
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_follow_the_ended_phase() {
        assert!(completion_message(Phase::Work).0.contains("Break"));
        assert!(completion_message(Phase::Break).0.contains("Work"));
    }
}
