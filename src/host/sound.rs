use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

const TONE_HZ: f32 = 440.0;
const AMPLITUDE: f32 = 0.2;

/// Square wave that plays while the sound timer is non-zero. The stream stays
/// open for the life of the value; `set_active` only gates it.
pub struct Beeper {
    active: Arc<AtomicBool>,
    _stream: cpal::Stream,
}

impl Beeper {
    pub fn new() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no output device available")?;
        let supported_config = device
            .default_output_config()
            .context("error while querying configs")?;
        let sample_format = supported_config.sample_format();
        let config: cpal::StreamConfig = supported_config.into();
        let active = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            cpal::SampleFormat::I8 => build::<i8>(&device, &config, &active)?,
            cpal::SampleFormat::I16 => build::<i16>(&device, &config, &active)?,
            cpal::SampleFormat::I32 => build::<i32>(&device, &config, &active)?,
            cpal::SampleFormat::I64 => build::<i64>(&device, &config, &active)?,
            cpal::SampleFormat::U8 => build::<u8>(&device, &config, &active)?,
            cpal::SampleFormat::U16 => build::<u16>(&device, &config, &active)?,
            cpal::SampleFormat::U32 => build::<u32>(&device, &config, &active)?,
            cpal::SampleFormat::U64 => build::<u64>(&device, &config, &active)?,
            cpal::SampleFormat::F32 => build::<f32>(&device, &config, &active)?,
            cpal::SampleFormat::F64 => build::<f64>(&device, &config, &active)?,
            sample_format => bail!("unsupported sample format '{sample_format}'"),
        };
        stream.play()?;

        Ok(Self {
            active,
            _stream: stream,
        })
    }

    pub fn set_active(&self, on: bool) {
        self.active.store(on, Ordering::Relaxed);
    }
}

fn build<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    active: &Arc<AtomicBool>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let sample_rate = config.sample_rate.0 as f32;
    let channels = config.channels as usize;
    let active = Arc::clone(active);

    let mut sample_clock = 0f32;
    let mut next_value = move || {
        sample_clock = (sample_clock + 1.0) % sample_rate;
        if !active.load(Ordering::Relaxed) {
            return 0.0;
        }
        if (sample_clock * TONE_HZ / sample_rate).fract() < 0.5 {
            AMPLITUDE
        } else {
            -AMPLITUDE
        }
    };

    let err_fn = |err| log::error!("an error occurred on stream: {err}");

    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            write_data(data, channels, &mut next_value)
        },
        err_fn,
        None,
    )
}

fn write_data<T>(output: &mut [T], channels: usize, next_sample: &mut dyn FnMut() -> f32)
where
    T: Sample + FromSample<f32>,
{
    for frame in output.chunks_mut(channels) {
        let value: T = T::from_sample(next_sample());
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}
