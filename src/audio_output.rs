use crate::library::SampleHandle;
use crate::note::NoteName;
use crate::trigger::AudioSink;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{error, info, warn};

/// Voices queued between the session and the audio callback.
const VOICE_QUEUE: usize = 64;
/// Voices mixed at once; the oldest is dropped beyond this.
const MAX_VOICES: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("no default audio output device")]
    NoDevice,
    #[error("unsupported sample format {0}")]
    UnsupportedFormat(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// One sounding sample. `pos` is in source frames; `step` is the ratio of
/// source rate to device rate.
struct Voice {
    sample: SampleHandle,
    pos: f64,
    step: f64,
}

/// Sums active voices into interleaved output buffers. Runs on the audio
/// thread; new voices arrive over a channel and never block it.
pub struct Mixer {
    rx: Receiver<SampleHandle>,
    voices: Vec<Voice>,
    device_rate: u32,
}

impl Mixer {
    pub fn new(rx: Receiver<SampleHandle>, device_rate: u32) -> Self {
        Self {
            rx,
            voices: Vec::with_capacity(MAX_VOICES),
            device_rate: device_rate.max(1),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        while let Ok(sample) = self.rx.try_recv() {
            if self.voices.len() >= MAX_VOICES {
                self.voices.remove(0);
            }
            let step = sample.sample_rate.max(1) as f64 / self.device_rate as f64;
            self.voices.push(Voice {
                sample,
                pos: 0.0,
                step,
            });
        }

        out.fill(0.0);
        let channels = channels.max(1);
        for voice in &mut self.voices {
            let src = &voice.sample;
            let src_ch = src.channels.max(1) as usize;
            let frames = src.frames();
            for frame in out.chunks_mut(channels) {
                let i = voice.pos as usize;
                if i >= frames {
                    break;
                }
                for (c, s) in frame.iter_mut().enumerate() {
                    *s += src.samples[i * src_ch + c.min(src_ch - 1)];
                }
                voice.pos += voice.step;
            }
        }
        self.voices
            .retain(|v| (v.pos as usize) < v.sample.frames());
        for s in out.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
    }
}

/// Plays triggered samples on the default output device.
///
/// Holds the cpal `Stream` alive. Drop this to stop playback.
pub struct CpalSink {
    tx: Sender<SampleHandle>,
    _stream: Stream,
}

impl CpalSink {
    pub fn start() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        info!(
            "Audio output: {}",
            device.name().unwrap_or_else(|_| "unknown".into())
        );

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Backend(e.to_string()))?;
        let format = supported.sample_format();
        let config: StreamConfig = supported.into();
        info!(
            "Playback config: {}Hz  {} ch  {:?}",
            config.sample_rate.0, config.channels, format
        );

        let (tx, rx) = bounded::<SampleHandle>(VOICE_QUEUE);
        let mixer = Mixer::new(rx, config.sample_rate.0);

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer)?,
            fmt => return Err(AudioError::UnsupportedFormat(format!("{fmt:?}"))),
        };
        stream
            .play()
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        Ok(Self {
            tx,
            _stream: stream,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut mixer: Mixer,
) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();
    let err_fn = |e: cpal::StreamError| error!("Audio stream error: {e}");
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.resize(data.len(), 0.0);
                mixer.fill(&mut scratch, channels);
                for (out, &s) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(s);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::Backend(e.to_string()))
}

impl AudioSink for CpalSink {
    fn play(&mut self, note: NoteName, sample: &SampleHandle) {
        match self.tx.try_send(sample.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Voice queue full, dropping {}", note),
            Err(TrySendError::Disconnected(_)) => warn!("Audio stream gone, dropping {}", note),
        }
    }
}
