//! Sound effects and background music.
//!
//! Cues are addressed by name. [`SynthAudio`] renders them as short sine
//! tone sequences on a dedicated thread that owns the output stream;
//! playback failures are logged and never reach the caller.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rodio::{source::SineWave, OutputStream, OutputStreamHandle, Sink, Source};

const EFFECT_VOLUME: f32 = 0.18;
const MUSIC_VOLUME: f32 = 0.06;

type Notes = &'static [(f32, u64)];

/// Fire-and-forget playback. Shared with the effect handler.
pub trait AudioService: Send + Sync {
    fn play_sound(&self, name: &str);
    fn play_music(&self, name: &str);
    fn pause_music(&self, paused: bool);
}

/// Swallows every request. Used with `--mute`.
#[derive(Debug, Default)]
pub struct MutedAudio;

impl AudioService for MutedAudio {
    fn play_sound(&self, name: &str) {
        tracing::trace!(name, "muted sound");
    }

    fn play_music(&self, name: &str) {
        tracing::trace!(name, "muted music");
    }

    fn pause_music(&self, _paused: bool) {}
}

#[derive(Debug)]
enum AudioCommand {
    Sound(String),
    Music(String),
    PauseMusic(bool),
}

pub struct SynthAudio {
    commands: Sender<AudioCommand>,
}

impl SynthAudio {
    pub fn spawn() -> Self {
        let (commands, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || audio_thread(receiver));
        if let Err(err) = spawned {
            tracing::warn!(%err, "audio thread failed to start");
        }
        Self { commands }
    }

    fn send(&self, command: AudioCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("audio thread gone, command dropped");
        }
    }
}

impl AudioService for SynthAudio {
    fn play_sound(&self, name: &str) {
        self.send(AudioCommand::Sound(name.to_string()));
    }

    fn play_music(&self, name: &str) {
        self.send(AudioCommand::Music(name.to_string()));
    }

    fn pause_music(&self, paused: bool) {
        self.send(AudioCommand::PauseMusic(paused));
    }
}

fn audio_thread(commands: Receiver<AudioCommand>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(%err, "no audio output, sound disabled");
            for command in commands {
                tracing::trace!(?command, "dropped");
            }
            return;
        }
    };

    let mut music: Option<Sink> = None;
    for command in commands {
        match command {
            AudioCommand::Sound(name) => match sound_notes(&name) {
                Some(notes) => play_detached(&handle, notes),
                None => tracing::warn!(name = %name, "unknown sound cue"),
            },
            AudioCommand::Music(name) => {
                let Some(notes) = music_notes(&name) else {
                    tracing::warn!(name = %name, "unknown music track");
                    continue;
                };
                match Sink::try_new(&handle) {
                    Ok(sink) => {
                        sink.append(tone_sequence(notes, MUSIC_VOLUME).repeat_infinite());
                        music = Some(sink);
                    }
                    Err(err) => tracing::warn!(%err, name = %name, "music sink unavailable"),
                }
            }
            AudioCommand::PauseMusic(paused) => {
                if let Some(sink) = music.as_ref() {
                    if paused {
                        sink.pause();
                    } else {
                        sink.play();
                    }
                }
            }
        }
    }
}

fn play_detached(handle: &OutputStreamHandle, notes: Notes) {
    match Sink::try_new(handle) {
        Ok(sink) => {
            sink.append(tone_sequence(notes, EFFECT_VOLUME));
            sink.detach();
        }
        Err(err) => tracing::warn!(%err, "effect sink unavailable"),
    }
}

fn tone_sequence(notes: Notes, volume: f32) -> impl Source<Item = f32> + Send + 'static {
    rodio::source::from_iter(notes.iter().map(move |&(freq, ms)| {
        SineWave::new(freq)
            .take_duration(Duration::from_millis(ms))
            .amplify(volume)
    }))
}

pub fn sound_notes(name: &str) -> Option<Notes> {
    let notes: Notes = match name {
        "HandleButton" => &[(880.0, 40)],
        "AcceptButton" => &[(660.0, 50), (990.0, 70)],
        "HitSFX" => &[(220.0, 90), (160.0, 90)],
        "Hit2SFX" => &[(300.0, 60), (200.0, 60), (150.0, 80)],
        "BoingSFX" => &[(330.0, 80), (440.0, 80), (330.0, 80)],
        "BoostDefenseSFX" => &[(523.0, 80), (659.0, 80), (784.0, 120)],
        "GameOverSFX" => &[(392.0, 150), (330.0, 150), (262.0, 300)],
        "ExclamationSound" => &[(1046.0, 90), (1318.0, 120)],
        "StartBattle" => &[(262.0, 100), (330.0, 100), (392.0, 100), (523.0, 200)],
        _ => return None,
    };
    Some(notes)
}

pub fn music_notes(name: &str) -> Option<Notes> {
    let notes: Notes = match name {
        "Home" => &[
            (392.0, 300),
            (440.0, 300),
            (494.0, 300),
            (392.0, 300),
            (523.0, 600),
            (494.0, 300),
            (440.0, 300),
            (392.0, 600),
            (330.0, 300),
            (349.0, 300),
            (392.0, 900),
        ],
        _ => return None,
    };
    Some(notes)
}
