//! Processing the entries of an array in parallel.
//!
//! The input node is a record whose last field is an array. The other fields
//! are the common inputs, read by every entry. The output node is an array
//! kept at the same size as the input array; entry `i` of the output is
//! computed from entry `i` of the input and the common inputs.
//!
//! Entries are recomputed only when needed: all of them when a common input
//! changed or the array changed structure, otherwise only the entries whose
//! input changed. Each entry is computed into a private scratch tree, so
//! workers share nothing mutable.

use alloc::fmt::Write as _;
use core::fmt;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, debug_span, warn};
use weft_types::{ModelError, Path, TypeExp, TypeSystem, TypeSystemError, ValueHolder};

use crate::{Changes, NodeId, ProcessorOptions, ValueTree};

/// What a worker sees while processing one entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryContext<'a> {
    pub type_system: &'a TypeSystem,
    pub input: &'a ValueTree,
    /// Input nodes shared by all entries, in field order.
    pub common_inputs: &'a [NodeId],
    /// The input entry.
    pub entry: NodeId,
    pub index: usize,
    /// Path of the input entry, for messages.
    pub path: &'a Path,
}

pub trait EntryProcessor: Send + Sync {
    /// Compute the output for one entry. `output` is a tree holding the
    /// current output entry; the processor writes the new one into it.
    fn process_entry(&self, context: &EntryContext<'_>, output: &mut ValueTree) -> Result<(), ModelError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub path: Path,
    pub message: String,
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn format_failures(failures: &[EntryFailure]) -> String {
    let mut out = String::new();
    for failure in failures {
        let _ = writeln!(out, "  {failure}");
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    TypeSystem(#[from] TypeSystemError),

    /// Outputs of the other entries were committed.
    #[error("{} entries failed:\n{}", .failures.len(), format_failures(.failures))]
    EntriesFailed { failures: Vec<EntryFailure> },

    #[error("cannot build thread pool: {0}")]
    ThreadPool(String),
}

struct Job {
    index: usize,
    entry: NodeId,
    path: Path,
    output: ValueHolder,
}

pub struct ParallelProcessor<P> {
    processor: P,
    pool: Option<rayon::ThreadPool>,
}

impl<P: EntryProcessor> ParallelProcessor<P> {
    /// Runs on rayon's global pool.
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            pool: None,
        }
    }

    pub fn with_options(processor: P, options: &ProcessorOptions) -> Result<Self, ProcessError> {
        let pool = options
            .num_threads
            .map(|num_threads| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|err| ProcessError::ThreadPool(err.to_string()))
            })
            .transpose()?;
        Ok(Self { processor, pool })
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// [`ParallelProcessor::process_value`] on the roots of both trees.
    pub fn process(
        &self,
        type_system: &TypeSystem,
        input: &ValueTree,
        output: &mut ValueTree,
    ) -> Result<(), ProcessError> {
        let (input_node, output_node) = (input.root(), output.root());
        self.process_value(type_system, input, input_node, output, output_node)
    }

    /// Bring the output array at `output_node` up to date with the input
    /// record at `input_node`, using the change flags of `input`.
    ///
    /// If some entries fail, the outputs of the others are still written and
    /// [`ProcessError::EntriesFailed`] lists the failed ones.
    pub fn process_value(
        &self,
        type_system: &TypeSystem,
        input: &ValueTree,
        input_node: NodeId,
        output: &mut ValueTree,
        output_node: NodeId,
    ) -> Result<(), ProcessError> {
        let fields: Vec<NodeId> = input.children(input_node).map(|(_, child)| child).collect();
        let Some((&array, common_inputs)) = fields.split_last() else {
            return Err(ModelError::WrongKind {
                expected: "record ending with an array",
                found: input.value(input_node).kind_name().into(),
            }
            .into());
        };
        let num_entries = input.num_children(array);

        let output_type = output.resolve_type(type_system, output_node)?;
        let output_array = output_type.as_array().ok_or_else(|| ModelError::WrongKind {
            expected: "array",
            found: output.value(output_node).kind_name().into(),
        })?;
        let entry_type = output_array.entry_type().clone();
        let mut output_value = output.value(output_node).clone();
        output_array.set_size(type_system, &mut output_value, num_entries)?;
        let resized = !output_value.is_shared_with(output.value(output_node));
        if resized {
            output.set_value(type_system, output_node, output_value)?;
        }

        let common_changed = common_inputs
            .iter()
            .any(|&node| input.is_changed(node, Changes::SOMETHING_CHANGED));
        let structure_changed = input.is_changed(array, Changes::STRUCTURE_CHANGED);
        let process_all = common_changed || structure_changed || resized;

        let current_outputs = output.value(output_node).as_array().unwrap_or_default();
        let jobs: Vec<Job> = input
            .children(array)
            .enumerate()
            .filter(|&(_, (_, entry))| process_all || input.is_changed(entry, Changes::SOMETHING_CHANGED))
            .map(|(index, (_, entry))| Job {
                index,
                entry,
                path: input.path_from_root(entry),
                output: current_outputs[index].clone(),
            })
            .collect();
        debug!(
            num_entries,
            num_jobs = jobs.len(),
            common_changed,
            structure_changed,
            resized,
            "processing entries"
        );
        if jobs.is_empty() {
            return Ok(());
        }

        let run = || -> Vec<Result<(usize, ValueHolder), EntryFailure>> {
            jobs.par_iter()
                .map(|job| {
                    self.run_job(type_system, input, common_inputs, &entry_type, job)
                        .map(|value| (job.index, value))
                })
                .collect()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut failures = Vec::new();
        let mut new_outputs = output.value(output_node).clone();
        if let Some(entries) = new_outputs.copy_contents_and_get_non_const().as_array_mut() {
            for result in results {
                match result {
                    Ok((index, value)) => entries[index] = value,
                    Err(failure) => failures.push(failure),
                }
            }
        }
        output.set_value(type_system, output_node, new_outputs)?;

        if failures.is_empty() {
            Ok(())
        } else {
            failures.sort_by(|a, b| a.path.cmp(&b.path));
            Err(ProcessError::EntriesFailed { failures })
        }
    }

    fn run_job(
        &self,
        type_system: &TypeSystem,
        input: &ValueTree,
        common_inputs: &[NodeId],
        entry_type: &TypeExp,
        job: &Job,
    ) -> Result<ValueHolder, EntryFailure> {
        let span = debug_span!("entry", path = %job.path);
        let _guard = span.enter();
        let context = EntryContext {
            type_system,
            input,
            common_inputs,
            entry: job.entry,
            index: job.index,
            path: &job.path,
        };
        let result = ValueTree::with_value(type_system, entry_type.clone(), job.output.clone())
            .map_err(ModelError::from)
            .and_then(|mut scratch| {
                self.processor.process_entry(&context, &mut scratch)?;
                Ok(scratch.root_value().clone())
            });
        result.map_err(|err| {
            warn!(error = %err, "entry failed");
            EntryFailure {
                path: job.path.clone(),
                message: err.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use pretty_assertions::assert_eq;
    use weft_types::{
        Identifier, Value,
        builtins::{ArrayType, EnumType, Field, IntType, RecordType},
    };

    use crate::{InstanceMut, test_utils::init_test_logging};

    /// Output entry = factor * input entry.
    #[derive(Default)]
    struct Scale {
        calls: AtomicUsize,
    }

    impl EntryProcessor for Scale {
        fn process_entry(&self, context: &EntryContext<'_>, output: &mut ValueTree) -> Result<(), ModelError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let factor = context.input.value(context.common_inputs[0]).as_int().unwrap();
            let entry = context.input.value(context.entry).as_int().unwrap();
            let root = output.root();
            output.set_value(context.type_system, root, Value::Int(factor * entry).into())
        }
    }

    fn input_type() -> TypeExp {
        RecordType::constructed_exp(vec![
            Field::new(Identifier::new("factor").unwrap(), IntType::range_exp(0, 100, 1)),
            Field::new(
                Identifier::new("entries").unwrap(),
                ArrayType::type_exp(IntType::type_exp(), 0, 16, 0),
            ),
        ])
    }

    fn output_type() -> TypeExp {
        ArrayType::type_exp(IntType::range_exp(0, 100, 0), 0, 16, 0)
    }

    fn set_input(ts: &TypeSystem, input: &mut ValueTree, factor: i64, entries: &[i64]) {
        let mut root = InstanceMut::root(ts, input);
        root.field("factor").unwrap().set_int(factor).unwrap();
        let mut array = root.field("entries").unwrap();
        array.set_array_size(entries.len()).unwrap();
        for (i, value) in entries.iter().enumerate() {
            array.entry(i).unwrap().set_int(*value).unwrap();
        }
    }

    fn outputs(output: &ValueTree) -> Vec<i64> {
        output
            .root_value()
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry.as_int().unwrap())
            .collect()
    }

    #[test]
    fn test_only_changed_entries_are_reprocessed() {
        init_test_logging();
        let ts = TypeSystem::new();
        let mut input = ValueTree::new(&ts, input_type()).unwrap();
        let mut output = ValueTree::new(&ts, output_type()).unwrap();
        let processor = ParallelProcessor::new(Scale::default());

        set_input(&ts, &mut input, 2, &[1, 2, 3]);
        processor.process(&ts, &input, &mut output).unwrap();
        assert_eq!(outputs(&output), vec![2, 4, 6]);
        assert_eq!(processor.processor().calls.load(Ordering::Relaxed), 3);

        input.clear_changes(input.root());
        let entry = input.follow(&"entries/1".parse().unwrap()).unwrap();
        input.set_value(&ts, entry, Value::Int(10).into()).unwrap();
        processor.process(&ts, &input, &mut output).unwrap();
        assert_eq!(outputs(&output), vec![2, 20, 6]);
        assert_eq!(processor.processor().calls.load(Ordering::Relaxed), 4);

        input.clear_changes(input.root());
        let factor = input.follow(&"factor".parse().unwrap()).unwrap();
        input.set_value(&ts, factor, Value::Int(3).into()).unwrap();
        processor.process(&ts, &input, &mut output).unwrap();
        assert_eq!(outputs(&output), vec![3, 30, 9]);
        assert_eq!(processor.processor().calls.load(Ordering::Relaxed), 7);

        // Nothing flagged: nothing to do.
        input.clear_changes(input.root());
        processor.process(&ts, &input, &mut output).unwrap();
        assert_eq!(processor.processor().calls.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn test_failed_entries_are_reported_together() {
        let ts = TypeSystem::new();
        let mut input = ValueTree::new(&ts, input_type()).unwrap();
        let mut output = ValueTree::new(&ts, output_type()).unwrap();
        let processor = ParallelProcessor::with_options(
            Scale::default(),
            &ProcessorOptions {
                num_threads: Some(2),
            },
        )
        .unwrap();

        set_input(&ts, &mut input, 10, &[5, 50, 60, 1]);
        let err = processor.process(&ts, &input, &mut output).unwrap_err();
        let ProcessError::EntriesFailed { failures } = &err else {
            panic!("unexpected error {err}");
        };
        let paths: Vec<String> = failures.iter().map(|f| f.path.to_string()).collect();
        assert_eq!(paths, vec!["entries/1", "entries/2"]);
        let message = err.to_string();
        assert!(message.contains("entries/1"));
        assert!(message.contains("entries/2"));
        assert!(!message.contains("entries/0"));
        assert!(!message.contains("entries/3"));
        assert_eq!(outputs(&output), vec![50, 0, 0, 10]);
    }

    #[test]
    fn test_shrinking_input_shrinks_output() {
        let ts = TypeSystem::new();
        let mut input = ValueTree::new(&ts, input_type()).unwrap();
        let mut output = ValueTree::new(&ts, output_type()).unwrap();
        let processor = ParallelProcessor::new(Scale::default());

        set_input(&ts, &mut input, 1, &[1, 2, 3]);
        processor.process(&ts, &input, &mut output).unwrap();
        input.clear_changes(input.root());

        let mut root = InstanceMut::root(&ts, &mut input);
        root.field("entries").unwrap().set_array_size(1).unwrap();
        processor.process(&ts, &input, &mut output).unwrap();
        assert_eq!(outputs(&output), vec![1]);
        assert!(output.is_changed(output.root(), Changes::STRUCTURE_CHANGED));
    }

    #[test]
    fn test_input_must_end_with_array() {
        let ts = TypeSystem::new();
        let input = ValueTree::new(&ts, IntType::type_exp()).unwrap();
        let mut output = ValueTree::new(&ts, output_type()).unwrap();
        let processor = ParallelProcessor::new(Scale::default());
        assert!(matches!(
            processor.process(&ts, &input, &mut output),
            Err(ProcessError::Model(ModelError::WrongKind { .. }))
        ));
    }

    #[test]
    fn test_output_type_unknown_to_type_system() {
        let ts = TypeSystem::new();
        let mut other = TypeSystem::new();
        let level = other
            .add_type(
                Identifier::builtin("Level"),
                EnumType::new(vec![Identifier::builtin("low"), Identifier::builtin("high")], 0),
            )
            .unwrap();
        let input = ValueTree::new(&ts, input_type()).unwrap();
        let mut output = ValueTree::new(&other, level).unwrap();
        let processor = ParallelProcessor::new(Scale::default());
        assert!(matches!(
            processor.process(&ts, &input, &mut output),
            Err(ProcessError::TypeSystem(TypeSystemError::UnknownType(_)))
        ));
    }
}
