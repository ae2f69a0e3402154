use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, Stream};
use crossbeam_channel::Sender;
use log::{debug, error, info};

use super::{SoundEngine, VoiceBank, VoiceSettings};
use crate::core::pitch::Pitch;
use crate::messaging::{EngineMessage, MessageBus};

/// Messages applied per audio callback before rendering
const MESSAGES_PER_CALLBACK: usize = 1024;

/// Live synthesizer running on the default cpal output device
pub struct SynthEngine {
    sender: Sender<EngineMessage>,
    clock: Arc<AtomicU64>,
    sample_rate: f32,
    device_name: String,
    _stream: Stream,
}

impl SynthEngine {
    pub fn start(voice: &VoiceSettings) -> Result<Self> {
        let host = cpal::default_host();
        info!("using audio host: {}", host.id().name());

        let device = host
            .default_output_device()
            .context("No output device available")?;
        let device_name = device.name().unwrap_or_else(|_| "unknown device".to_string());
        info!("using output device: {}", device_name);

        let config = device
            .default_output_config()
            .context("Failed to query output configuration")?;
        debug!("device config: {:?}", config);

        let sample_format = config.sample_format();
        let config = cpal::StreamConfig::from(config);
        let sample_rate = config.sample_rate.0 as f32;

        let bus = MessageBus::new();
        let sender = bus.sender();
        let bank = voice.bank(sample_rate);
        let clock = Arc::new(AtomicU64::new(0));

        let stream = match sample_format {
            SampleFormat::F32 => create_stream::<f32>(&device, &config, bus, bank, Arc::clone(&clock)),
            SampleFormat::I16 => create_stream::<i16>(&device, &config, bus, bank, Arc::clone(&clock)),
            SampleFormat::U16 => create_stream::<u16>(&device, &config, bus, bank, Arc::clone(&clock)),
            other => anyhow::bail!("Unsupported sample format {:?}", other),
        }?;

        stream.play().context("Failed to start audio stream")?;
        info!("audio stream started at {} Hz", sample_rate);

        Ok(Self {
            sender,
            clock,
            sample_rate,
            device_name,
            _stream: stream,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn send(&self, msg: EngineMessage) {
        if self.sender.send(msg).is_err() {
            error!("audio thread is gone, dropping message");
        }
    }
}

impl SoundEngine for SynthEngine {
    fn now(&self) -> f64 {
        self.clock.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    fn trigger_attack_release(&self, pitch: Pitch, duration: f64, when: f64) {
        self.send(EngineMessage::ScheduleNote { pitch, duration, when });
    }

    fn trigger_attack(&self, pitch: Pitch) {
        self.send(EngineMessage::NoteOn(pitch));
    }

    fn trigger_release(&self, pitch: Pitch) {
        self.send(EngineMessage::NoteOff(pitch));
    }

    fn release_all(&self) {
        self.send(EngineMessage::ReleaseAll);
    }

    fn cancel_scheduled(&self) {
        self.send(EngineMessage::CancelScheduled);
    }
}

fn create_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    bus: MessageBus,
    mut bank: VoiceBank,
    clock: Arc<AtomicU64>,
) -> Result<Stream>
where
    T: Sample + Send + 'static + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let err_fn = |err| error!("an error occurred on the audio stream: {}", err);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            bus.process_messages(&mut bank, MESSAGES_PER_CALLBACK);

            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(bank.next_sample());
                for sample in frame.iter_mut() {
                    *sample = value;
                }
            }

            clock.store(bank.clock(), Ordering::Relaxed);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
