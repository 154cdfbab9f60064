use std::f32::consts::PI;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use turing_cv::NoteEncoder;

/// Pitch of a 0 V output: C2.
const ZERO_VOLT_HZ: f32 = 65.406;

/// How long each monitored step sounds before release.
const GATE_SECS: f32 = 0.12;

// ── Waveform ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WaveType { Sine, Square, Sawtooth, Triangle }

impl WaveType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sine" => Some(Self::Sine), "square" => Some(Self::Square),
            "saw" | "sawtooth" => Some(Self::Sawtooth), "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sine => "Sine", Self::Square => "Square",
            Self::Sawtooth => "Sawtooth", Self::Triangle => "Triangle",
        }
    }
}

/// Frequency a 1 V/oct oscillator would play for an output code.
pub fn cv_to_freq(code: u16) -> f32 {
    ZERO_VOLT_HZ * 2f32.powf(NoteEncoder::code_to_volts(code))
}

// ── ADSR voice ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum EnvelopeStage { Attack, Decay, Sustain, Release, Off }

#[derive(Clone, Debug)]
struct Voice {
    frequency:     f32,
    phase:         f32,
    stage:         EnvelopeStage,
    level:         f32,
    release_level: f32,
    gate_left:     u32,
}

impl Voice {
    const ATTACK:  f32 = 0.005;
    const DECAY:   f32 = 0.06;
    const SUSTAIN: f32 = 0.6;
    const RELEASE: f32 = 0.15;

    fn new(frequency: f32, gate: u32) -> Self {
        Self { frequency, phase: 0.0, stage: EnvelopeStage::Attack,
               level: 0.0, release_level: 0.0, gate_left: gate }
    }

    fn release(&mut self) {
        if self.stage != EnvelopeStage::Off {
            self.release_level = self.level;
            self.stage = EnvelopeStage::Release;
        }
    }

    fn is_finished(&self) -> bool { self.stage == EnvelopeStage::Off }

    fn next_sample(&mut self, sr: f32, wave: WaveType) -> f32 {
        let dt = 1.0 / sr;
        if self.gate_left > 0 {
            self.gate_left -= 1;
            if self.gate_left == 0 { self.release(); }
        }
        match self.stage {
            EnvelopeStage::Attack => {
                self.level += dt / Self::ATTACK;
                if self.level >= 1.0 { self.level = 1.0; self.stage = EnvelopeStage::Decay; }
            }
            EnvelopeStage::Decay => {
                self.level -= dt * (1.0 - Self::SUSTAIN) / Self::DECAY;
                if self.level <= Self::SUSTAIN { self.level = Self::SUSTAIN; self.stage = EnvelopeStage::Sustain; }
            }
            EnvelopeStage::Sustain => { self.level = Self::SUSTAIN; }
            EnvelopeStage::Release => {
                self.level -= dt * self.release_level / Self::RELEASE;
                if self.level <= 0.0 { self.level = 0.0; self.stage = EnvelopeStage::Off; }
            }
            EnvelopeStage::Off => return 0.0,
        }

        let sample = match wave {
            WaveType::Sine     => (self.phase * 2.0 * PI).sin(),
            WaveType::Square   => if self.phase < 0.5 { 1.0 } else { -1.0 },
            WaveType::Sawtooth => 2.0 * self.phase - 1.0,
            WaveType::Triangle => {
                if self.phase < 0.5 { 4.0 * self.phase - 1.0 } else { 3.0 - 4.0 * self.phase }
            }
        };

        self.phase += self.frequency / sr;
        if self.phase >= 1.0 { self.phase -= 1.0; }
        sample * self.level
    }
}

// ── CV monitor ────────────────────────────────────────────────────────────────

/// Mono monitor voice that follows the CV output. A new step cuts the previous one.
pub struct Monitor {
    sample_rate: f32,
    pub wave:    WaveType,
    pub volume:  f32,
    voice:       Option<Voice>,
}

impl Monitor {
    pub fn new(sample_rate: f32, wave: WaveType, volume: f32) -> Self {
        Self { sample_rate, wave, volume: volume.clamp(0.0, 1.0), voice: None }
    }

    pub fn trigger(&mut self, code: u16) {
        let gate = (GATE_SECS * self.sample_rate) as u32;
        self.voice = Some(Voice::new(cv_to_freq(code), gate.max(1)));
    }

    pub fn is_sounding(&self) -> bool { self.voice.is_some() }

    pub fn next_sample(&mut self) -> f32 {
        let (sr, wave) = (self.sample_rate, self.wave);
        let Some(v) = self.voice.as_mut() else { return 0.0 };
        let s = v.next_sample(sr, wave);
        if v.is_finished() { self.voice = None; }
        s * self.volume
    }

    fn fill<T>(&mut self, out: &mut [T], channels: usize)
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        for frame in out.chunks_mut(channels) {
            let s = T::from_sample(self.next_sample());
            for slot in frame.iter_mut() { *slot = s; }
        }
    }
}

// ── Output stream ─────────────────────────────────────────────────────────────

pub struct AudioEngine {
    monitor: Arc<Mutex<Monitor>>,
    _stream: cpal::Stream,
}

impl AudioEngine {
    pub fn new(wave: WaveType, volume: f32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no audio output device found"))?;
        let config = device
            .default_output_config()
            .context("querying default output config")?;
        log::info!(target: "audio", "output device {} at {} Hz",
            device.name().unwrap_or_else(|_| "?".to_string()), config.sample_rate().0);

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        let monitor = Arc::new(Mutex::new(Monitor::new(sample_rate, wave, volume)));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config.into(), Arc::clone(&monitor), channels),
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config.into(), Arc::clone(&monitor), channels),
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config.into(), Arc::clone(&monitor), channels),
            other => Err(anyhow!("unsupported sample format {:?}", other)),
        }?;
        stream.play().context("starting audio stream")?;

        Ok(Self { monitor, _stream: stream })
    }

    fn build_stream<T>(
        device:   &cpal::Device,
        config:   &cpal::StreamConfig,
        monitor:  Arc<Mutex<Monitor>>,
        channels: usize,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if let Ok(mut m) = monitor.lock() { m.fill(data, channels); }
            },
            |err| log::error!(target: "audio", "stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }

    /// Sound one emitted CV code.
    pub fn play_cv(&self, code: u16) {
        if let Ok(mut m) = self.monitor.lock() { m.trigger(code); }
    }
}
