//! The pseudocode view's state on the plugin side: which function is
//! displayed and where the cursor is.

use std::path;

use tracing::{event, instrument, Level};

use crate::config;
use crate::logic::decompiler;
use crate::logic::navigate;
use crate::model::addr;
use crate::model::listing::place;
use crate::model::listing::token;
use crate::model::registry;

/// The three places a host viewer needs to show a grid: the first row,
/// the last row, and where the cursor goes.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub min: place::GridPlace,
    pub max: place::GridPlace,
    pub current: place::GridPlace,
}

/// Functions whose comment contains this are decompiled by [Command::Regression].
pub const REGRESSION_MARKER: &str = "<retdec_select>";

/// What the plugin's entry point was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the function containing `addr` in the pseudocode view.
    Selective {
        addr: addr::Address,
        invoked_from_view: bool,
    },
    /// Write the whole program as C, to `<input>.c` unless `output` is given.
    Full {
        output: Option<path::PathBuf>,
    },
    /// Write the first function marked with [REGRESSION_MARKER] as plain text
    /// to `<input>.c`, without touching the pseudocode view.
    Regression,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Displayed(Presentation),
    Written(path::PathBuf),
    /// No function carries the regression marker.
    Nothing,
}

/// Failure of a decompilation whose result goes to a file.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error(transparent)]
    Decompilation(#[from] decompiler::DecompileError),

    #[error("failed to write {path}: {error}")]
    Io {
        path: path::PathBuf,
        error: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cannot run because the initial autoanalysis has not been finished")]
    AnalysisPending,

    #[error(transparent)]
    Resolve(#[from] registry::ResolveError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

pub struct Session<'a> {
    registry: &'a registry::Registry,
    backend: registry::Backend<'a>,
    displayed: Option<place::GridPlace>,
}

impl<'a> Session<'a> {
    pub fn new(registry: &'a registry::Registry, backend: registry::Backend<'a>) -> Session<'a> {
        Session {
            registry,
            backend,
            displayed: None,
        }
    }

    pub fn registry(&self) -> &registry::Registry {
        self.registry
    }

    pub fn backend(&self) -> &registry::Backend<'a> {
        &self.backend
    }

    /// Where the cursor of the pseudocode view is, if anything is displayed.
    pub fn displayed(&self) -> Option<&place::GridPlace> {
        self.displayed.as_ref()
    }

    /// Records a cursor movement made by the host.
    pub fn set_displayed(&mut self, place: place::GridPlace) {
        self.displayed = Some(place);
    }

    /// Decompiles the function containing `addr` (reusing its grid unless
    /// `redecompile` is set) and makes it the displayed one, with the cursor
    /// on `addr`.
    #[instrument(skip(self))]
    pub fn decompile_and_display(&mut self, addr: addr::Address, redecompile: bool) -> Result<Presentation, registry::ResolveError> {
        let grid = self.registry.resolve_address(&self.backend, addr, redecompile)?;

        let presentation = Presentation {
            min: place::GridPlace::new(grid.clone(), grid.min_position()),
            max: place::GridPlace::new(grid.clone(), grid.max_position()),
            current: place::GridPlace::at_address(grid.clone(), addr),
        };

        event!(Level::INFO, %grid, current = %presentation.current, "displaying");
        self.displayed = Some(presentation.current.clone());

        Ok(presentation)
    }

    /// Entry point for the plugin's hotkey. Selective decompilation invoked
    /// from the pseudocode view itself decompiles the displayed function
    /// again; invoked from anywhere else, it shows the existing pseudocode if
    /// there is any. Nothing runs before the host's auto-analysis is done.
    #[instrument(skip(self))]
    pub fn run(&mut self, command: Command) -> Result<Outcome, RunError> {
        if !self.backend.analysis.analysis_finished() {
            event!(Level::WARN, "auto-analysis still running");
            return Err(RunError::AnalysisPending);
        }

        Ok(match command {
            Command::Selective { addr, invoked_from_view } => Outcome::Displayed(self.decompile_and_display(addr, invoked_from_view)?),
            Command::Full { output } => Outcome::Written(self.full_decompilation(output)?),
            Command::Regression => match self.regression_decompilation()? {
                Some(path) => Outcome::Written(path),
                None => Outcome::Nothing,
            },
        })
    }

    /// Decompiles the whole program to C source at `output`, or at
    /// `<input>.c` by default. Returns where the source went.
    #[instrument(skip(self))]
    pub fn full_decompilation(&self, output: Option<path::PathBuf>) -> Result<path::PathBuf, OutputError> {
        let config = self.backend.config.full(&self.backend.analysis.image().input_path, output);
        self.write_output(&config)
    }

    /// Decompiles the first function whose comment carries
    /// [REGRESSION_MARKER] to verbose plain text at `<input>.c`. The
    /// registry and the displayed place are left alone. None if no function
    /// is marked.
    #[instrument(skip(self))]
    pub fn regression_decompilation(&self) -> Result<Option<path::PathBuf>, RunError> {
        let analysis = self.backend.analysis;
        let marked = analysis.units().into_iter()
            .find(|&id| analysis.unit_comment(id).map_or(false, |c| c.contains(REGRESSION_MARKER)));

        let id = match marked {
            Some(id) => id,
            None => {
                event!(Level::INFO, "no function marked for regression");
                return Ok(None);
            }
        };

        let unit = registry::selectable_unit(&self.backend, id)?;
        let config = self.backend.config.regression(&analysis.image().input_path, unit.extent);
        event!(Level::INFO, %unit, "regression decompilation");

        Ok(Some(self.write_output(&config)?))
    }

    fn write_output(&self, config: &config::Config) -> Result<path::PathBuf, OutputError> {
        let text = decompiler::run_decompilation(self.backend.decompiler, config)?;
        let output = match &config.output_file {
            Some(output) => output.clone(),
            None => config::default_output_path(&config.input_file),
        };

        std::fs::write(&output, text).map_err(|error| OutputError::Io {
            path: output.clone(),
            error,
        })?;

        event!(Level::INFO, ?output, "wrote decompiled output");
        Ok(output)
    }

    /// Renames every `kind` token reading `old` in every decompiled function
    /// and moves the displayed place onto the rebuilt grid. Returns the number
    /// of functions affected.
    pub fn rename(&mut self, kind: token::TokenKind, old: &str, new: &str) -> usize {
        let replaced = self.registry.rebuild_all(kind, old, new);

        if let Some(current) = &self.displayed {
            if let Some(live) = current.grid().and_then(|g| self.registry.get(g.unit().id)) {
                let mut moved = place::GridPlace::new(live, current.position());
                moved.lnnum = current.lnnum;
                self.displayed = Some(moved);
            }
        }

        replaced
    }

    /// Follows the token under the cursor. A function opens in this view; a
    /// global variable comes back as a jump for the address view.
    pub fn follow(&mut self) -> Result<Option<place::Place>, registry::ResolveError> {
        let target = match &self.displayed {
            Some(current) => navigate::jump_target(current, self.registry, &self.backend)?,
            None => None,
        };

        if let Some(place::Place::Grid(gp)) = &target {
            self.displayed = Some(gp.clone());
        }

        Ok(target)
    }
}

impl<'a> std::fmt::Debug for Session<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("registry", self.registry)
            .field("displayed", &self.displayed)
            .finish_non_exhaustive()
    }
}
