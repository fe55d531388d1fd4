//! Columnar time-series recorders with a fixed schema per entity kind.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Result, SimError};

/// A fixed set of named columns a recorder carries.
pub trait Column: Copy + 'static {
    /// Every column of the schema, in storage order.
    const ALL: &'static [Self];

    /// Storage position of this column.
    fn position(self) -> usize;

    /// Header name used in exports.
    fn name(self) -> &'static str;
}

/// Per-vehicle outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvColumn {
    Soc,
    EnergyInput,
    Plugged,
}

impl Column for EvColumn {
    const ALL: &'static [Self] = &[EvColumn::Soc, EvColumn::EnergyInput, EvColumn::Plugged];

    fn position(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            EvColumn::Soc => "SOC",
            EvColumn::EnergyInput => "ENERGY_INPUT",
            EvColumn::Plugged => "PLUGGED",
        }
    }
}

/// Per-charger outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargerColumn {
    EnergyInput,
}

impl Column for ChargerColumn {
    const ALL: &'static [Self] = &[ChargerColumn::EnergyInput];

    fn position(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        "ENERGY_INPUT"
    }
}

/// Per-site outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteColumn {
    EnergyInput,
}

impl Column for SiteColumn {
    const ALL: &'static [Self] = &[SiteColumn::EnergyInput];

    fn position(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        "ENERGY_INPUT"
    }
}

/// Anything that accepts batch writes of a column over a run of timesteps.
pub trait Recorder<C: Column> {
    /// Overwrites `column` at `timesteps` with `values`.
    ///
    /// # Errors
    ///
    /// Fails when the timesteps are not a contiguous window of the index or
    /// when the lengths differ.
    fn record_batch(
        &mut self,
        timesteps: &[DateTime<Utc>],
        column: C,
        values: &[f64],
    ) -> Result<()>;

    /// Adds `values` onto `column` at `timesteps`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Recorder::record_batch`].
    fn accumulate_batch(
        &mut self,
        timesteps: &[DateTime<Utc>],
        column: C,
        values: &[f64],
    ) -> Result<()>;

    /// Full recorded series of `column`.
    fn column(&self, column: C) -> &[f64];
}

/// Zero-initialized table of `C` columns over a shared, immutable index.
///
/// The index is reference-counted so that cloning a recorder (for example
/// when a charger roster is snapshotted per strategy) copies every column
/// while sharing the timestamps.
#[derive(Debug, Clone)]
pub struct TimeseriesRecorder<C: Column> {
    index: Arc<[DateTime<Utc>]>,
    columns: Vec<Vec<f64>>,
    _schema: PhantomData<C>,
}

impl<C: Column> TimeseriesRecorder<C> {
    /// Creates a recorder sized to `index` with every column set to zero.
    pub fn new(index: Arc<[DateTime<Utc>]>) -> Self {
        let columns = C::ALL.iter().map(|_| vec![0.0; index.len()]).collect();
        Self {
            index,
            columns,
            _schema: PhantomData,
        }
    }

    /// The timestamps this recorder is indexed by.
    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` when the index is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sets every column back to zero.
    pub fn clear(&mut self) {
        for col in &mut self.columns {
            col.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Header names in storage order.
    pub fn column_names() -> Vec<&'static str> {
        C::ALL.iter().map(|c| c.name()).collect()
    }

    fn window(
        &mut self,
        timesteps: &[DateTime<Utc>],
        column: C,
        values_len: usize,
    ) -> Result<&mut [f64]> {
        if timesteps.len() != values_len {
            return Err(SimError::LengthMismatch {
                what: "recorder batch",
                expected: timesteps.len(),
                actual: values_len,
            });
        }
        let Some(first) = timesteps.first() else {
            return Ok(&mut []);
        };
        let start = self
            .index
            .binary_search(first)
            .map_err(|_| SimError::UnknownTimestep(*first))?;
        let end = start + timesteps.len();
        if end > self.index.len() {
            return Err(SimError::WindowOverflow {
                start,
                len: timesteps.len(),
                index_len: self.index.len(),
            });
        }
        Ok(&mut self.columns[column.position()][start..end])
    }
}

impl<C: Column> Recorder<C> for TimeseriesRecorder<C> {
    fn record_batch(
        &mut self,
        timesteps: &[DateTime<Utc>],
        column: C,
        values: &[f64],
    ) -> Result<()> {
        self.window(timesteps, column, values.len())?
            .copy_from_slice(values);
        Ok(())
    }

    fn accumulate_batch(
        &mut self,
        timesteps: &[DateTime<Utc>],
        column: C,
        values: &[f64],
    ) -> Result<()> {
        let window = self.window(timesteps, column, values.len())?;
        for (slot, v) in window.iter_mut().zip(values) {
            *slot += v;
        }
        Ok(())
    }

    fn column(&self, column: C) -> &[f64] {
        &self.columns[column.position()]
    }
}
