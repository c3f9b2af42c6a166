//! Audio collaborator seam
//!
//! The simulation only ever talks to an [`AudioSink`]. On the web the sink is
//! a procedural WebAudio ambience - no external files needed.

/// Per-frame audio drive, both in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioSignal {
    /// How hard the player is moving
    pub moving: f32,
    /// How close the enemy is
    pub danger: f32,
}

impl AudioSignal {
    pub fn new(moving: f32, danger: f32) -> Self {
        Self {
            moving: moving.clamp(0.0, 1.0),
            danger: danger.clamp(0.0, 1.0),
        }
    }
}

/// Anything that can voice the game
pub trait AudioSink {
    /// Session started or resumed
    fn start(&mut self);
    /// Session paused or ended
    fn stop(&mut self);
    /// Called once per simulated frame
    fn update(&mut self, signal: AudioSignal);
    /// One footstep
    fn blip_foot(&mut self);
    /// Master volume (0.0 - 1.0)
    fn set_volume(&mut self, _volume: f32) {}
    /// Mute/unmute all audio
    fn set_muted(&mut self, _muted: bool) {}
}

/// Sink that discards everything (headless runs and tests)
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn update(&mut self, _signal: AudioSignal) {}
    fn blip_foot(&mut self) {}
}

#[cfg(target_arch = "wasm32")]
pub use web::AmbientAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{
        AudioContext, BiquadFilterNode, BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
    };

    use super::{AudioSignal, AudioSink};

    /// Running drone voices
    struct Voices {
        drone: OscillatorNode,
        drone_gain: GainNode,
        filter: BiquadFilterNode,
        whine: OscillatorNode,
        whine_gain: GainNode,
    }

    /// WebAudio ambience: a filtered drone that opens up with danger,
    /// a thin whine as the enemy closes in, and footstep thuds
    pub struct AmbientAudio {
        ctx: Option<AudioContext>,
        voices: Option<Voices>,
        master_volume: f32,
        muted: bool,
    }

    impl Default for AmbientAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AmbientAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                voices: None,
                master_volume: 0.8,
                muted: false,
            }
        }

        fn effective_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.master_volume }
        }

        /// Create an oscillator with its own gain node
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;

            Some((osc, gain))
        }

        fn build_voices(ctx: &AudioContext) -> Option<Voices> {
            let (drone, drone_gain) = Self::create_osc(ctx, 55.0, OscillatorType::Sawtooth)?;
            let filter = ctx.create_biquad_filter().ok()?;
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(300.0);
            drone_gain.gain().set_value(0.0);
            drone_gain.connect_with_audio_node(&filter).ok()?;
            filter.connect_with_audio_node(&ctx.destination()).ok()?;

            let (whine, whine_gain) = Self::create_osc(ctx, 180.0, OscillatorType::Sine)?;
            whine_gain.gain().set_value(0.0);
            whine_gain.connect_with_audio_node(&ctx.destination()).ok()?;

            drone.start().ok()?;
            whine.start().ok()?;

            Some(Voices {
                drone,
                drone_gain,
                filter,
                whine,
                whine_gain,
            })
        }
    }

    impl AudioSink for AmbientAudio {
        fn start(&mut self) {
            let Some(ctx) = &self.ctx else { return };
            // Browsers require a user gesture before audio runs
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            if self.voices.is_none() {
                self.voices = Self::build_voices(ctx);
                if self.voices.is_none() {
                    log::warn!("Could not build ambient voices");
                }
            }
        }

        fn stop(&mut self) {
            if let Some(v) = self.voices.take() {
                let _ = v.drone.stop();
                let _ = v.whine.stop();
            }
        }

        fn update(&mut self, signal: AudioSignal) {
            let (Some(ctx), Some(v)) = (&self.ctx, &self.voices) else {
                return;
            };
            let vol = self.effective_volume();
            let t = ctx.current_time();
            let smooth = 0.12;

            let drone_level = vol * (0.04 + 0.05 * signal.moving + 0.06 * signal.danger);
            v.drone_gain
                .gain()
                .set_target_at_time(drone_level, t, smooth)
                .ok();
            v.filter
                .frequency()
                .set_target_at_time(300.0 + 1400.0 * signal.danger, t, smooth)
                .ok();

            let whine_level = vol * 0.07 * signal.danger * signal.danger;
            v.whine_gain
                .gain()
                .set_target_at_time(whine_level, t, smooth)
                .ok();
            v.whine
                .frequency()
                .set_target_at_time(180.0 + 260.0 * signal.danger, t, smooth)
                .ok();
        }

        fn set_volume(&mut self, volume: f32) {
            self.master_volume = volume.clamp(0.0, 1.0);
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            // Silence the drone now rather than on the next update
            if muted && let (Some(ctx), Some(v)) = (&self.ctx, &self.voices) {
                let t = ctx.current_time();
                v.drone_gain.gain().set_target_at_time(0.0, t, 0.05).ok();
                v.whine_gain.gain().set_target_at_time(0.0, t, 0.05).ok();
            }
        }

        fn blip_foot(&mut self) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            let Some((osc, gain)) = Self::create_osc(ctx, 110.0, OscillatorType::Triangle) else {
                return;
            };
            if gain.connect_with_audio_node(&ctx.destination()).is_err() {
                return;
            }
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.07)
                .ok();
            osc.frequency().set_value_at_time(110.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(55.0, t + 0.07)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.09).ok();
        }
    }
}
