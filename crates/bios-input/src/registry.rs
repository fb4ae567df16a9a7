//! Key to request bindings for one aircraft profile

use std::collections::HashMap;

use tracing::debug;

use crate::error::RequestError;
use crate::key::{InputKey, Transition};
use crate::request::RequestModel;

/// Bindings from panel keys to requests
///
/// Unbound keys resolve to an empty request. The registry is rebuilt
/// whenever the active profile changes.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    requests: HashMap<InputKey, RequestModel>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key name, request)` pairs as found in configuration
    ///
    /// Pairs with a blank request are skipped.
    pub fn from_pairs<I, K, R>(pairs: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (K, R)>,
        K: AsRef<str>,
        R: AsRef<str>,
    {
        let mut registry = Self::new();
        for (key, request) in pairs {
            if request.as_ref().trim().is_empty() {
                continue;
            }
            let key: InputKey = key.as_ref().parse()?;
            registry.set_request(key, request.as_ref())?;
        }
        Ok(registry)
    }

    /// Bind `key` to a request string, replacing any previous binding
    ///
    /// A blank request unbinds the key.
    pub fn set_request(&mut self, key: InputKey, request: &str) -> Result<(), RequestError> {
        let model = RequestModel::from_request(key, request)?;
        if model.is_empty() {
            self.requests.remove(&key);
        } else {
            debug!("Bound {} -> {}", key, model.raw_request());
            self.requests.insert(key, model);
        }
        Ok(())
    }

    /// Binding for `key`, if any
    pub fn request(&self, key: InputKey) -> Option<&RequestModel> {
        self.requests.get(&key)
    }

    /// Binding for `key`, falling back to an empty request
    ///
    /// An empty request stored this way does not count as a bound key.
    pub fn request_mut(&mut self, key: InputKey) -> &mut RequestModel {
        self.requests
            .entry(key)
            .or_insert_with(|| RequestModel::empty(key))
    }

    /// Encode the frames for one input event on `key`
    pub fn frames<F>(
        &mut self,
        key: InputKey,
        transition: Option<Transition>,
        live_value: F,
    ) -> Vec<Vec<u8>>
    where
        F: FnOnce(&str) -> i64,
    {
        match self.requests.get_mut(&key) {
            Some(model) => model.frames(transition, live_value),
            None => Vec::new(),
        }
    }

    /// Control names of cycle requests, sorted and deduplicated
    ///
    /// These are the fields whose live value must be tracked to seed the
    /// cycle cursors.
    pub fn cycle_controls(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .requests
            .values()
            .filter(|m| m.is_cycle())
            .map(|m| m.ctrl_name())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Forget every cycle position
    pub fn reset_cycles(&mut self) {
        for model in self.requests.values_mut() {
            model.reset_cycle();
        }
    }

    /// Bound keys
    pub fn keys(&self) -> impl Iterator<Item = InputKey> + '_ {
        self.requests
            .iter()
            .filter(|(_, model)| !model.is_empty())
            .map(|(key, _)| *key)
    }

    /// Number of bound keys
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::LcdButton;

    fn viper_registry() -> KeyRegistry {
        KeyRegistry::from_pairs([
            ("G1_M1", "IFF_MASTER_KNB CYCLE 1 4"),
            ("G2_M1", "ICP_COM1_BTN PUSH_BUTTON"),
            ("G3_M1", ""),
            ("M_6", "MASTER_ARM_SW CYCLE 1 2"),
            ("M_7", "IFF_MASTER_KNB CYCLE 1 4"),
            ("OK", "UFC_ENTER PUSH_BUTTON"),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_pairs_skips_blank() {
        let registry = viper_registry();
        assert_eq!(registry.len(), 5);
        assert!(registry.request(InputKey::GKey { key: 3, mode: 1 }).is_none());
    }

    #[test]
    fn test_from_pairs_rejects_unknown_key() {
        let err = KeyRegistry::from_pairs([("G1", "A INC")]).unwrap_err();
        assert_eq!(err, RequestError::UnknownKey("G1".into()));
    }

    #[test]
    fn test_from_pairs_rejects_bad_control() {
        let err = KeyRegistry::from_pairs([("G1_M1", "bad INC")]).unwrap_err();
        assert_eq!(err, RequestError::InvalidControlName("bad".into()));
    }

    #[test]
    fn test_request_mut_falls_back_to_empty() {
        let mut registry = viper_registry();
        let key = InputKey::MouseButton(9);
        let bound = registry.len();

        let model = registry.request_mut(key);
        assert!(model.is_empty());
        assert_eq!(model.key(), key);

        assert_eq!(registry.len(), bound);
        assert!(registry.keys().all(|k| k != key));
        assert!(KeyRegistry::new().is_empty());
    }

    #[test]
    fn test_unbound_key_sends_nothing() {
        let mut registry = viper_registry();
        let frames = registry.frames(
            InputKey::LcdButton(LcdButton::Menu),
            Some(Transition::Pressed),
            |_| 0,
        );
        assert!(frames.is_empty());
    }

    #[test]
    fn test_set_request_rebinds_and_unbinds() {
        let mut registry = viper_registry();
        let key = InputKey::GKey { key: 2, mode: 1 };

        registry.set_request(key, "ICP_COM2_BTN PUSH_BUTTON").unwrap();
        assert_eq!(registry.request(key).map(|m| m.ctrl_name()), Some("ICP_COM2_BTN"));

        registry.set_request(key, "").unwrap();
        assert!(registry.request(key).is_none());
    }

    #[test]
    fn test_cycle_controls() {
        let registry = viper_registry();
        assert_eq!(
            registry.cycle_controls(),
            vec!["IFF_MASTER_KNB", "MASTER_ARM_SW"]
        );
    }

    #[test]
    fn test_frames_for_bound_key() {
        let mut registry = viper_registry();
        let frames = registry.frames(
            InputKey::LcdButton(LcdButton::Ok),
            Some(Transition::Pressed),
            |_| 0,
        );
        assert_eq!(frames, vec![b"UFC_ENTER 1\n".to_vec(), b"UFC_ENTER 0\n".to_vec()]);
    }

    #[test]
    fn test_reset_cycles_reseeds() {
        let mut registry = viper_registry();
        let key = InputKey::MouseButton(6);
        let press = Some(Transition::Pressed);

        assert_eq!(registry.frames(key, press, |_| 0), vec![b"MASTER_ARM_SW 1\n".to_vec()]);
        registry.reset_cycles();
        assert_eq!(registry.frames(key, press, |_| 2), vec![b"MASTER_ARM_SW 1\n".to_vec()]);
        assert_eq!(registry.frames(key, press, |_| 2), vec![b"MASTER_ARM_SW 0\n".to_vec()]);
    }
}
