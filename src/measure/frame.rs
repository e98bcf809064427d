use ndarray::ArrayView1;
use std::collections::HashMap;
use std::ops::Range;

use crate::measure::context::ContextError;

/// Reusable named-argument frame for interpreted measurement callbacks
///
/// Built once per evaluation call. Slot contents are overwritten in place by
/// [`ArgFrame::bind`] before every invocation rather than rebuilt, so the
/// only thing that changes between invocations is the numeric contents.
///
/// Slot order is fixed: `t`, the observation names, the state names, `unit`,
/// the parameter names, then the covariate names. The log-scale flag is
/// carried alongside the numeric slots and is constant for the whole call.
pub struct ArgFrame {
    names: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<f64>,
    log: bool,
    obs: Range<usize>,
    state: Range<usize>,
    unit_slot: usize,
    params: Range<usize>,
    covars: Range<usize>,
}

impl ArgFrame {
    /// Lay out the frame for the given name vectors
    ///
    /// Names must be unique across the whole frame; `t` and `unit` are
    /// reserved slot names and collide with identically named variables.
    pub(crate) fn new(
        onames: &[String],
        snames: &[String],
        pnames: &[String],
        cnames: &[String],
        log: bool,
    ) -> Result<Self, ContextError> {
        let total = 2 + onames.len() + snames.len() + pnames.len() + cnames.len();
        let mut names = Vec::with_capacity(total);

        names.push("t".to_string());
        let obs = names.len()..names.len() + onames.len();
        names.extend(onames.iter().cloned());
        let state = names.len()..names.len() + snames.len();
        names.extend(snames.iter().cloned());
        let unit_slot = names.len();
        names.push("unit".to_string());
        let params = names.len()..names.len() + pnames.len();
        names.extend(pnames.iter().cloned());
        let covars = names.len()..names.len() + cnames.len();
        names.extend(cnames.iter().cloned());

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(ContextError::DuplicateName { name: name.clone() });
            }
        }

        Ok(ArgFrame {
            values: vec![f64::NAN; names.len()],
            names,
            index,
            log,
            obs,
            state,
            unit_slot,
            params,
            covars,
        })
    }

    /// Overwrite the slot contents for the next invocation
    ///
    /// `unit` is `None` when the frame is configured not to bind the unit
    /// identifier; the slot then keeps its NaN fill.
    #[inline]
    pub(crate) fn bind(
        &mut self,
        t: f64,
        obs: ArrayView1<'_, f64>,
        state: ArrayView1<'_, f64>,
        unit: Option<f64>,
        params: ArrayView1<'_, f64>,
        covars: &[f64],
    ) {
        self.values[0] = t;
        for (slot, value) in self.obs.clone().zip(obs.iter()) {
            self.values[slot] = *value;
        }
        for (slot, value) in self.state.clone().zip(state.iter()) {
            self.values[slot] = *value;
        }
        if let Some(unit) = unit {
            self.values[self.unit_slot] = unit;
        }
        for (slot, value) in self.params.clone().zip(params.iter()) {
            self.values[slot] = *value;
        }
        for (slot, value) in self.covars.clone().zip(covars.iter()) {
            self.values[slot] = *value;
        }
    }

    /// Look up a slot value by name
    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.values[i])
    }

    /// Slot names in call order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn t(&self) -> f64 {
        self.values[0]
    }

    pub fn unit(&self) -> f64 {
        self.values[self.unit_slot]
    }

    /// Whether the callback should return the density on the log scale
    pub fn log(&self) -> bool {
        self.log
    }

    pub fn obs(&self) -> &[f64] {
        &self.values[self.obs.clone()]
    }

    pub fn state(&self) -> &[f64] {
        &self.values[self.state.clone()]
    }

    pub fn params(&self) -> &[f64] {
        &self.values[self.params.clone()]
    }

    pub fn covars(&self) -> &[f64] {
        &self.values[self.covars.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn frame() -> ArgFrame {
        ArgFrame::new(
            &names(&["cases"]),
            &names(&["s", "i"]),
            &names(&["beta"]),
            &names(&["pop"]),
            true,
        )
        .unwrap()
    }

    #[test]
    fn slots_are_laid_out_in_call_order() {
        let frame = frame();
        assert_eq!(
            frame.names(),
            &["t", "cases", "s", "i", "unit", "beta", "pop"]
        );
    }

    #[test]
    fn bind_overwrites_numeric_contents() {
        let mut frame = frame();
        frame.bind(
            1.5,
            arr1(&[10.0]).view(),
            arr1(&[0.9, 0.1]).view(),
            Some(3.0),
            arr1(&[0.5]).view(),
            &[1000.0],
        );

        assert_eq!(frame.t(), 1.5);
        assert_eq!(frame.get("cases"), Some(10.0));
        assert_eq!(frame.get("s"), Some(0.9));
        assert_eq!(frame.get("i"), Some(0.1));
        assert_eq!(frame.unit(), 3.0);
        assert_eq!(frame.get("beta"), Some(0.5));
        assert_eq!(frame.get("pop"), Some(1000.0));
        assert!(frame.log());
        assert_eq!(frame.get("missing"), None);
    }

    #[test]
    fn unbound_unit_slot_stays_nan() {
        let mut frame = frame();
        frame.bind(
            0.0,
            arr1(&[1.0]).view(),
            arr1(&[1.0, 1.0]).view(),
            None,
            arr1(&[1.0]).view(),
            &[1.0],
        );
        assert!(frame.unit().is_nan());
    }

    #[test]
    fn colliding_names_are_rejected() {
        let result = ArgFrame::new(
            &names(&["unit"]),
            &names(&[]),
            &names(&[]),
            &names(&[]),
            false,
        );
        assert!(matches!(
            result,
            Err(ContextError::DuplicateName { .. })
        ));
    }
}
