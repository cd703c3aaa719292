//! Stack-based fold over type expressions.
//!
//! The fold tracks how many generic types enclose the expression being
//! visited, which is what type variables are resolved against.

use alloc::{sync::Arc, vec, vec::Vec};

use crate::{TypeConstructorArguments, TypeExp};

/// Control flow for the fold traversal.
pub enum FoldStep<Output> {
    /// Process the type arguments, then call `combine`.
    Recurse,
    /// Finished with this expression; its type arguments are not visited.
    Done(Output),
    /// Visit this expression instead, at the same generic depth.
    Replace(TypeExp),
}

pub trait Fold {
    type Output;
    type Error;

    /// Called before the type arguments of `exp` are visited.
    ///
    /// `generic_depth` counts the generic types between the root of the fold
    /// and `exp`, not counting `exp` itself.
    fn visit(
        &mut self,
        exp: &TypeExp,
        generic_depth: usize,
    ) -> Result<FoldStep<Self::Output>, Self::Error>;

    /// Called with the results of the type arguments, in order.
    fn combine(
        &mut self,
        exp: &TypeExp,
        generic_depth: usize,
        children: impl ExactSizeIterator<Item = Self::Output> + DoubleEndedIterator,
    ) -> Result<Self::Output, Self::Error>;
}

enum Task {
    Visit(TypeExp, usize),
    Combine(usize, TypeExp, usize),
}

pub fn drive_fold<F: Fold>(root: TypeExp, mut folder: F) -> Result<F::Output, F::Error> {
    let mut stack = vec![Task::Visit(root, 0)];
    let mut results: Vec<F::Output> = Vec::new();

    while let Some(task) = stack.pop() {
        match task {
            Task::Visit(exp, depth) => match folder.visit(&exp, depth)? {
                FoldStep::Done(out) => results.push(out),
                FoldStep::Replace(other) => stack.push(Task::Visit(other, depth)),
                FoldStep::Recurse => {
                    let child_depth = if exp.is_generic() { depth + 1 } else { depth };
                    let children: Vec<TypeExp> = exp.type_arguments().to_vec();
                    stack.push(Task::Combine(children.len(), exp, depth));
                    stack.extend(
                        children
                            .into_iter()
                            .rev()
                            .map(|child| Task::Visit(child, child_depth)),
                    );
                }
            },
            Task::Combine(count, exp, depth) => {
                let start = results
                    .len()
                    .checked_sub(count)
                    .expect("Bug: result stack underflow");
                let children = results.drain(start..);
                let out = folder.combine(&exp, depth, children)?;
                results.push(out);
            }
        }
    }

    debug_assert_eq!(results.len(), 1, "Bug: expected exactly one fold result");
    Ok(results.pop().expect("Bug: empty fold result stack"))
}

/// Replaces the type variables that refer to the root generic type.
pub(crate) struct SubstituteTypeVariables<'a> {
    pub assignments: &'a [TypeExp],
}

impl Fold for SubstituteTypeVariables<'_> {
    type Output = TypeExp;
    type Error = core::convert::Infallible;

    fn visit(&mut self, exp: &TypeExp, depth: usize) -> Result<FoldStep<TypeExp>, Self::Error> {
        if let Some((level, index)) = exp.type_variable_data() {
            let replacement = (level == depth)
                .then(|| self.assignments.get(index))
                .flatten()
                .filter(|assignment| !assignment.is_null());
            return Ok(FoldStep::Done(replacement.unwrap_or(exp).clone()));
        }
        if exp.type_arguments().is_empty() {
            return Ok(FoldStep::Done(exp.clone()));
        }
        Ok(FoldStep::Recurse)
    }

    fn combine(
        &mut self,
        exp: &TypeExp,
        _depth: usize,
        children: impl ExactSizeIterator<Item = TypeExp> + DoubleEndedIterator,
    ) -> Result<TypeExp, Self::Error> {
        let TypeExp::Constructed(constructor, arguments) = exp else {
            unreachable!("Bug: only constructed expressions have type arguments");
        };
        Ok(TypeExp::Constructed(
            constructor.clone(),
            Arc::new(TypeConstructorArguments {
                type_arguments: children.collect(),
                value_arguments: arguments.value_arguments.clone(),
            }),
        ))
    }
}

/// Whether some type variable escapes the root: it refers to a generic type
/// enclosing the whole expression.
pub(crate) struct HasFreeTypeVariables;

impl Fold for HasFreeTypeVariables {
    type Output = bool;
    type Error = core::convert::Infallible;

    fn visit(&mut self, exp: &TypeExp, depth: usize) -> Result<FoldStep<bool>, Self::Error> {
        if let Some((level, _)) = exp.type_variable_data() {
            return Ok(FoldStep::Done(level >= depth));
        }
        if exp.type_arguments().is_empty() {
            return Ok(FoldStep::Done(false));
        }
        Ok(FoldStep::Recurse)
    }

    fn combine(
        &mut self,
        _exp: &TypeExp,
        _depth: usize,
        mut children: impl ExactSizeIterator<Item = bool> + DoubleEndedIterator,
    ) -> Result<bool, Self::Error> {
        Ok(children.any(|free| free))
    }
}
