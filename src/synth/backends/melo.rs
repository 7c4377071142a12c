//! MeloTTS backend
//!
//! MeloTTS is a Python library, so the model lives in a child Python
//! process running a small driver script. The process is started by
//! `load`, which waits for the model to finish loading and for the
//! speaker map to arrive. After that the driver serves one JSON request
//! per line on stdin and answers with one JSON line on stdout:
//!
//! - `{"text": ..., "speaker": 0, "path": ..., "speed": 1.0}` → `{"ok": true}`
//! - on failure → `{"ok": false, "error": "..."}`
//!
//! Protocol lines are prefixed with `HABLA ` so that anything the model
//! itself prints on stdout is skipped. Dropping the model closes stdin,
//! which ends the driver.

use crate::synth::{Device, Language, LoadedModel, ModelLoader, SpeakerMap, VoiceModel};
use crate::{HablaError, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Marker in front of every protocol line written by the driver
const LINE_PREFIX: &str = "HABLA ";

/// Driver script run with `python -c`; argv is `[language, device]`
const DRIVER_SCRIPT: &str = r#"
import json
import sys
import warnings

warnings.filterwarnings('ignore')


def reply(obj):
    sys.stdout.write('HABLA ' + json.dumps(obj) + '\n')
    sys.stdout.flush()


try:
    from melo.api import TTS
    model = TTS(language=sys.argv[1], device=sys.argv[2])
    speakers = {str(k): int(v) for k, v in dict(model.hps.data.spk2id).items()}
except Exception as exc:
    reply({'ok': False, 'error': '%s: %s' % (type(exc).__name__, exc)})
    sys.exit(1)

reply({'ok': True, 'speakers': speakers})

for line in sys.stdin:
    line = line.strip()
    if not line:
        continue
    try:
        req = json.loads(line)
        model.tts_to_file(req['text'], req['speaker'], req['path'], speed=req['speed'])
        reply({'ok': True})
    except Exception as exc:
        reply({'ok': False, 'error': '%s: %s' % (type(exc).__name__, exc)})
"#;

/// Synthesis request sent to the driver
#[derive(Debug, Serialize)]
struct SynthRequest<'a> {
    text: &'a str,
    speaker: usize,
    path: &'a str,
    speed: f32,
}

/// Any reply from the driver
#[derive(Debug, Deserialize)]
struct DriverReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    speakers: Option<SpeakerMap>,
}

/// Starts MeloTTS driver processes
pub struct MeloLoader {
    /// Python interpreter with the `melo` package installed
    python: String,
}

impl MeloLoader {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl ModelLoader for MeloLoader {
    fn load(&self, language: Language, device: Device) -> Result<LoadedModel> {
        info!(
            "Loading MeloTTS model (language {}, device {}) with {}",
            language, device, self.python
        );

        let mut child = Command::new(&self.python)
            .arg("-c")
            .arg(DRIVER_SCRIPT)
            .arg(language.code())
            .arg(device.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HablaError::Model(format!("Failed to start {}: {}", self.python, e)))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdin, stdout, stderr) = match (stdin, stdout, stderr) {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, BufReader::new(stdout), stderr),
            _ => {
                reap(&mut child);
                return Err(HablaError::Model("Driver pipes unavailable".to_string()));
            }
        };

        // Drain stderr so model download progress can't fill the pipe
        let last_stderr = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&last_stderr);
        let stderr_reader = thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                debug!("melo stderr: {}", line);
                if !line.trim().is_empty() {
                    *sink.lock().unwrap_or_else(|e| e.into_inner()) = line;
                }
            }
        });

        let mut model = MeloModel {
            child,
            stdin: Some(stdin),
            stdout,
            last_stderr,
            stderr_reader: Some(stderr_reader),
        };

        let reply = match model.read_reply() {
            Ok(reply) => reply,
            Err(e) => {
                let detail = model.stderr_tail();
                return Err(HablaError::Model(format!("{}{}", e, detail)));
            }
        };

        if !reply.ok {
            return Err(HablaError::Model(format!(
                "MeloTTS failed to load: {}",
                reply.error.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        let speakers = reply.speakers.unwrap_or_default();
        debug!("MeloTTS speakers: {:?}", speakers);

        Ok(LoadedModel {
            model: Box::new(model),
            speakers,
        })
    }
}

/// A running MeloTTS driver with its model loaded
pub struct MeloModel {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,

    /// Last non-empty line the driver wrote to stderr
    last_stderr: Arc<Mutex<String>>,
    stderr_reader: Option<JoinHandle<()>>,
}

impl MeloModel {
    /// Read lines until the next protocol reply
    fn read_reply(&mut self) -> Result<DriverReply> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.stdout.read_line(&mut line)?;
            if n == 0 {
                return Err(HablaError::Model("MeloTTS driver exited unexpectedly".to_string()));
            }

            match line.trim_end().strip_prefix(LINE_PREFIX) {
                Some(payload) => return Ok(serde_json::from_str(payload)?),
                None => debug!("melo: {}", line.trim_end()),
            }
        }
    }

    /// Last stderr line from the driver, formatted for an error message
    fn stderr_tail(&mut self) -> String {
        self.stdin.take();
        let _ = self.child.wait();
        if let Some(reader) = self.stderr_reader.take() {
            let _ = reader.join();
        }

        let last = self.last_stderr.lock().unwrap_or_else(|e| e.into_inner());
        if last.is_empty() {
            String::new()
        } else {
            format!(" ({})", last.trim())
        }
    }
}

impl VoiceModel for MeloModel {
    fn name(&self) -> &str {
        "MeloTTS"
    }

    fn tts_to_file(&mut self, text: &str, speaker_id: usize, path: &Path, speed: f32) -> Result<()> {
        let path_str = path
            .to_str()
            .ok_or_else(|| HablaError::Synthesis(format!("Path is not valid UTF-8: {}", path.display())))?;

        let request = serde_json::to_string(&SynthRequest {
            text,
            speaker: speaker_id,
            path: path_str,
            speed,
        })?;

        debug!("Sending MeloTTS request for {}", path.display());
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| HablaError::Synthesis("MeloTTS driver already closed".to_string()))?;
        writeln!(stdin, "{}", request)?;
        stdin.flush()?;

        let reply = self.read_reply()?;
        if reply.ok {
            Ok(())
        } else {
            let message = reply.error.unwrap_or_else(|| "unknown error".to_string());
            error!("MeloTTS synthesis failed: {}", message);
            Err(HablaError::Synthesis(message))
        }
    }
}

impl Drop for MeloModel {
    fn drop(&mut self) {
        debug!("Shutting down MeloTTS driver");
        // Closing stdin ends the driver's request loop
        self.stdin.take();
        if let Err(e) = self.child.wait() {
            warn!("Failed to wait for MeloTTS driver: {}", e);
            reap(&mut self.child);
        }
    }
}

fn reap(child: &mut Child) {
    if child.kill().is_ok() {
        let _ = child.wait(); // Clean up zombie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        let json = serde_json::to_string(&SynthRequest {
            text: "Hola \"mundo\"\n",
            speaker: 3,
            path: "/tmp/Hola_speed_1.0.wav",
            speed: 1.5,
        })
        .unwrap();

        assert!(!json.contains('\n'));
        assert!(json.contains(r#""speaker":3"#));
        assert!(json.contains(r#""speed":1.5"#));
    }

    #[test]
    fn test_reply_decoding() {
        let ready: DriverReply = serde_json::from_str(r#"{"ok": true, "speakers": {"ES": 0}}"#).unwrap();
        assert!(ready.ok);
        assert_eq!(ready.speakers.unwrap().get("ES"), Some(&0));

        let failed: DriverReply =
            serde_json::from_str(r#"{"ok": false, "error": "ModuleNotFoundError: melo"}"#).unwrap();
        assert!(!failed.ok);
        assert!(failed.error.unwrap().contains("melo"));
    }

    #[test]
    fn test_missing_interpreter() {
        let loader = MeloLoader::new("habla-no-such-python");
        let err = loader.load(Language::Es, Device::Auto).err().expect("load should fail");
        assert!(err.to_string().contains("habla-no-such-python"));
    }

    #[test]
    fn test_load_melo_model() {
        match MeloLoader::new("python3").load(Language::Es, Device::Cpu) {
            Ok(loaded) => println!("✓ MeloTTS available with speakers {:?}", loaded.speakers),
            Err(e) => println!("⚠ MeloTTS backend not available: {}", e),
        }
    }
}
