//! Command-line logger
use super::{Event, LogError, Loggable, Logger};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use yansi::Paint;

/// Logger that writes periodic summaries to stdout.
pub struct CLILogger {
    events: [EventLog; 3],

    display_period: Duration,
    last_display_time: Instant,
}

impl CLILogger {
    #[must_use]
    pub fn new(display_period: Duration) -> Self {
        Self {
            events: [EventLog::new(), EventLog::new(), EventLog::new()],
            display_period,
            last_display_time: Instant::now(),
        }
    }

    /// Display the summary and clear all stored data.
    pub fn display(&mut self) {
        println!();
        for (event, event_log) in Event::ALL.iter().zip(&mut self.events) {
            let summary_size = event_log.index - event_log.summary_start_index;
            if summary_size == 0 {
                continue;
            }

            println!(
                "{}",
                Paint::yellow(format!("==== {:?} {} ====", event, event_log.index - 1)).bold()
            );
            for (name, aggregator) in &mut event_log.aggregators {
                println!("{}: {}", Paint::blue(name), aggregator);
                aggregator.clear();
            }
            event_log.summary_start_index = event_log.index;
        }
        self.last_display_time = Instant::now();
    }
}

impl Logger for CLILogger {
    fn log<'a>(
        &mut self,
        event: Event,
        name: &'a str,
        value: Loggable,
    ) -> Result<(), LogError<'a>> {
        let aggregators = &mut self.events[event.index()].aggregators;
        if let Some(aggregator) = aggregators.get_mut(name) {
            if let Err((value, expected)) = aggregator.update(value) {
                return Err(LogError::new(name, value, expected));
            }
        } else {
            aggregators.insert(name.into(), Aggregator::new(value));
        }
        Ok(())
    }

    fn done(&mut self, event: Event) {
        let event_log = &mut self.events[event.index()];
        event_log.index += 1;

        if self.last_display_time.elapsed() < self.display_period {
            return;
        }
        self.display();
    }
}

impl Drop for CLILogger {
    fn drop(&mut self) {
        // Flush everything not yet displayed.
        self.display();
    }
}

struct EventLog {
    /// Global index for this event
    index: u64,
    /// Value of `index` at the start of this summary period
    summary_start_index: u64,
    /// An aggregator for each log entry.
    aggregators: BTreeMap<String, Aggregator>,
}

impl EventLog {
    fn new() -> Self {
        Self {
            index: 0,
            summary_start_index: 0,
            aggregators: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
enum Aggregator {
    /// Aggregates nothing
    Nothing,
    /// Mean of scalar values since the last display.
    ScalarMean { sum: f64, count: u64 },
    /// Count of samples per index since the last display.
    IndexDistribution { counts: Vec<u64> },
}

impl Aggregator {
    fn new(value: Loggable) -> Self {
        let mut aggregator = match value {
            Loggable::Nothing => Self::Nothing,
            Loggable::Scalar(_) => Self::ScalarMean { sum: 0.0, count: 0 },
            Loggable::IndexSample { size, .. } => Self::IndexDistribution {
                counts: vec![0; size],
            },
        };
        aggregator.update(value).unwrap();
        aggregator
    }

    /// Update with a new value.
    ///
    /// Returns the value and a description of the expected structure
    /// if the value is incompatible with the current aggregation.
    fn update(&mut self, value: Loggable) -> Result<(), (Loggable, String)> {
        match (self, value) {
            (Self::Nothing, Loggable::Nothing) => Ok(()),
            (Self::ScalarMean { sum, count }, Loggable::Scalar(v)) => {
                *sum += v;
                *count += 1;
                Ok(())
            }
            (Self::IndexDistribution { counts }, Loggable::IndexSample { value, size })
                if counts.len() == size =>
            {
                counts[value] += 1;
                Ok(())
            }
            (aggregator, value) => Err((value, format!("{:?}", aggregator))),
        }
    }

    /// Clear aggregated data for the next summary period.
    fn clear(&mut self) {
        match self {
            Self::Nothing => {}
            Self::ScalarMean { sum, count } => {
                *sum = 0.0;
                *count = 0;
            }
            Self::IndexDistribution { counts } => counts.fill(0),
        }
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Nothing => write!(f, "-"),
            Self::ScalarMean { sum, count } => {
                if *count == 0 {
                    write!(f, "-")
                } else {
                    write!(f, "{:.5}", sum / *count as f64)
                }
            }
            Self::IndexDistribution { counts } => {
                let total: u64 = counts.iter().sum();
                write!(f, "[")?;
                for (i, n) in counts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if total > 0 {
                        write!(f, "{:.2}", *n as f64 / total as f64)?;
                    } else {
                        write!(f, "0")?;
                    }
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_mean_aggregation() {
        let mut aggregator = Aggregator::new(Loggable::Scalar(1.0));
        aggregator.update(Loggable::Scalar(3.0)).unwrap();
        assert_eq!(aggregator.to_string(), "2.00000");
    }

    #[test]
    fn structural_mismatch_is_an_error() {
        let mut logger = CLILogger::new(Duration::from_secs(3600));
        logger.log(Event::Epoch, "loss", Loggable::Scalar(0.5)).unwrap();
        assert!(logger
            .log(Event::Epoch, "loss", Loggable::IndexSample { value: 0, size: 2 })
            .is_err());
    }

    #[test]
    fn index_distribution_aggregation() {
        let mut aggregator = Aggregator::new(Loggable::IndexSample { value: 1, size: 2 });
        aggregator
            .update(Loggable::IndexSample { value: 1, size: 2 })
            .unwrap();
        assert_eq!(aggregator.to_string(), "[0.00, 1.00]");
    }
}
