//! Tone playback
//!
//! The simulation only talks to an `AudioSink`. On the web the sink is a Web
//! Audio synth with one oscillator voice per tone, so no sample files are
//! needed. Elsewhere a null or recording sink stands in.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::sim::Tone;

/// Something that can sound a tone
pub trait AudioSink {
    /// Play `tone` at `volume` (0.0 - 1.0)
    fn play(&mut self, tone: Tone, volume: f32);

    /// Goal fanfare
    fn play_clear(&mut self, volume: f32) {
        for tone in [Tone::C, Tone::E, Tone::G] {
            self.play(tone, volume);
        }
    }
}

/// Oscillator shape of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
}

/// How one tone is synthesized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub frequency: f32,
    pub waveform: Waveform,
    /// Decay time in seconds
    pub decay: f32,
}

impl Voice {
    pub fn for_tone(tone: Tone) -> Self {
        Self {
            frequency: tone.frequency(),
            waveform: Waveform::Triangle,
            decay: 0.6,
        }
    }
}

/// A resolved playback request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayRequest {
    pub tone: Tone,
    pub voice: Voice,
    pub gain: f32,
}

/// Registered voices, at most one per tone
#[derive(Debug, Clone, Default)]
pub struct ToneBank {
    voices: [Option<Voice>; 7],
}

impl ToneBank {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bank with a voice for every tone of the scale
    pub fn standard() -> Self {
        let mut bank = Self::empty();
        for tone in Tone::ALL {
            bank.register(tone, Voice::for_tone(tone));
        }
        bank
    }

    pub fn register(&mut self, tone: Tone, voice: Voice) {
        self.voices[tone.index()] = Some(voice);
    }

    pub fn voice(&self, tone: Tone) -> Option<&Voice> {
        self.voices[tone.index()].as_ref()
    }

    /// Resolve a play request; tones without a voice are skipped
    pub fn request(&self, tone: Tone, volume: f32) -> Option<PlayRequest> {
        let Some(voice) = self.voice(tone) else {
            trace!("No voice registered for tone {}", tone.as_str());
            return None;
        };
        Some(PlayRequest {
            tone,
            voice: *voice,
            gain: volume.clamp(0.0, 1.0),
        })
    }
}

/// Master/effects volume and mute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mixer {
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Mixer {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Mixer {
    pub fn from_settings(settings: &crate::Settings) -> Self {
        Self {
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

/// Sink that remembers what it was asked to play
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    bank: ToneBank,
    pub played: Vec<PlayRequest>,
    pub clears: Vec<f32>,
}

impl RecordingAudio {
    pub fn new(bank: ToneBank) -> Self {
        Self {
            bank,
            played: Vec::new(),
            clears: Vec::new(),
        }
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, tone: Tone, volume: f32) {
        if let Some(request) = self.bank.request(tone, volume) {
            self.played.push(request);
        }
    }

    fn play_clear(&mut self, volume: f32) {
        self.clears.push(volume);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, Mixer, ToneBank, Waveform};
    use crate::sim::Tone;

    /// Web Audio synth
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        bank: ToneBank,
        pub mixer: Mixer,
    }

    impl WebAudio {
        pub fn new(bank: ToneBank, mixer: Mixer) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, bank, mixer }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn context(&self) -> Option<&AudioContext> {
            let ctx = self.ctx.as_ref()?;
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            Some(ctx)
        }

        /// Oscillator routed through a gain node to the speakers
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            waveform: Waveform,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(match waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Square => OscillatorType::Square,
            });
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn pluck(
            ctx: &AudioContext,
            freq: f32,
            waveform: Waveform,
            gain_value: f32,
            decay: f64,
            delay: f64,
        ) {
            let Some((osc, gain)) = Self::create_osc(ctx, freq, waveform) else {
                return;
            };
            let t = ctx.current_time() + delay;
            gain.gain().set_value_at_time(gain_value, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + decay)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + decay + 0.05).ok();
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, tone: Tone, volume: f32) {
            let vol = self.mixer.effective_volume() * volume;
            if vol <= 0.0 {
                return;
            }
            let Some(request) = self.bank.request(tone, vol) else {
                return;
            };
            let Some(ctx) = self.context() else { return };
            Self::pluck(
                ctx,
                request.voice.frequency,
                request.voice.waveform,
                request.gain * 0.4,
                request.voice.decay as f64,
                0.0,
            );
        }

        /// Rising C-E-G-C arpeggio
        fn play_clear(&mut self, volume: f32) {
            let vol = self.mixer.effective_volume() * volume;
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = self.context() else { return };
            let notes = [
                Tone::C.frequency(),
                Tone::E.frequency(),
                Tone::G.frequency(),
                Tone::C.frequency() * 2.0,
            ];
            for (i, freq) in notes.iter().enumerate() {
                Self::pluck(ctx, *freq, Waveform::Triangle, vol * 0.3, 0.4, i as f64 * 0.1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_bank_covers_scale() {
        let bank = ToneBank::standard();
        for tone in Tone::ALL {
            let voice = bank.voice(tone).unwrap();
            assert_eq!(voice.frequency, tone.frequency());
        }
    }

    #[test]
    fn test_missing_voice_is_skipped() {
        let mut bank = ToneBank::empty();
        bank.register(Tone::E, Voice::for_tone(Tone::E));
        assert!(bank.request(Tone::C, 0.5).is_none());
        assert_eq!(bank.request(Tone::E, 0.5).unwrap().gain, 0.5);

        let mut audio = RecordingAudio::new(bank);
        audio.play(Tone::C, 1.0);
        audio.play(Tone::E, 1.0);
        assert_eq!(audio.played.len(), 1);
        assert_eq!(audio.played[0].tone, Tone::E);
    }

    #[test]
    fn test_request_clamps_gain() {
        let bank = ToneBank::standard();
        assert_eq!(bank.request(Tone::A, 3.0).unwrap().gain, 1.0);
        assert_eq!(bank.request(Tone::A, -1.0).unwrap().gain, 0.0);
    }

    #[test]
    fn test_mixer_mute() {
        let mut mixer = Mixer::default();
        assert!((mixer.effective_volume() - 0.8).abs() < 1e-6);
        mixer.muted = true;
        assert_eq!(mixer.effective_volume(), 0.0);
    }

    #[test]
    fn test_default_clear_plays_triad() {
        struct Tones(Vec<Tone>);
        impl AudioSink for Tones {
            fn play(&mut self, tone: Tone, _volume: f32) {
                self.0.push(tone);
            }
        }
        let mut sink = Tones(Vec::new());
        sink.play_clear(0.9);
        assert_eq!(sink.0, vec![Tone::C, Tone::E, Tone::G]);
    }
}
