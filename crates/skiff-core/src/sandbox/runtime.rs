//! Runtime table: how each module file kind gets probed and executed.

use std::path::{Path, PathBuf};

/// Probe program handed to `python3 -c`.
///
/// Imports the module file, inspects the entry attribute, and reports its
/// invocation variant as a single JSON line. Exceptions from the package's
/// own code are reported in the same shape, never as a crash.
const PYTHON_PROBE_SHIM: &str = r##"
import importlib.util
import inspect
import json
import os
import sys


def emit(payload):
    print(json.dumps(payload))


def load(module_file):
    name = os.path.splitext(os.path.basename(module_file))[0]
    spec = importlib.util.spec_from_file_location(name, module_file)
    if spec is None or spec.loader is None:
        raise ImportError('cannot load module from ' + module_file)
    module = importlib.util.module_from_spec(spec)
    sys.modules[name] = module
    spec.loader.exec_module(module)
    return module


def main():
    module_file, attribute = sys.argv[1], sys.argv[2]
    module = load(module_file)
    target = getattr(module, attribute, None)
    if target is None:
        raise AttributeError('module has no attribute ' + repr(attribute))
    if inspect.isclass(target):
        kind = 'class'
        probe = getattr(target, 'forward', None) or target
    else:
        kind = 'function'
        probe = target
    protocol = False
    try:
        signature = inspect.signature(probe)
        params = [p for p in signature.parameters.values() if p.name != 'self']
        protocol = len(params) == 1 and params[0].name == 'input'
    except (TypeError, ValueError):
        pass
    emit({'ok': True, 'kind': kind, 'protocol': protocol})


try:
    main()
except Exception as exc:
    emit({'ok': False, 'error': {'kind': type(exc).__name__, 'message': str(exc)}})
"##;

/// Call program handed to `python3 -c`.
///
/// Reads the envelope from stdin, imports the module file, dispatches per
/// the convention argument, awaits coroutine results, and prints the
/// outcome as a single JSON line. Package exceptions become a failure
/// outcome with the exception type name as the kind.
const PYTHON_CALL_SHIM: &str = r##"
import asyncio
import importlib.util
import inspect
import json
import os
import sys
import types


def jsonable(value):
    if hasattr(value, '__dict__'):
        return vars(value)
    return str(value)


def emit(payload):
    sys.stdout.write(json.dumps(payload, default=jsonable) + '\n')


def load(module_file):
    name = os.path.splitext(os.path.basename(module_file))[0]
    spec = importlib.util.spec_from_file_location(name, module_file)
    if spec is None or spec.loader is None:
        raise ImportError('cannot load module from ' + module_file)
    module = importlib.util.module_from_spec(spec)
    sys.modules[name] = module
    spec.loader.exec_module(module)
    return module


def accepts_keyword(target, name):
    try:
        signature = inspect.signature(target)
    except (TypeError, ValueError):
        return True
    for param in signature.parameters.values():
        if param.kind is inspect.Parameter.VAR_KEYWORD:
            return True
        if param.name == name and param.kind in (
            inspect.Parameter.POSITIONAL_OR_KEYWORD,
            inspect.Parameter.KEYWORD_ONLY,
        ):
            return True
    return False


def main():
    module_file, attribute, convention = sys.argv[1], sys.argv[2], sys.argv[3]
    envelope = json.load(sys.stdin)
    module = load(module_file)
    target = getattr(module, attribute)
    if inspect.isclass(target):
        instance = target()
        target = getattr(instance, 'forward', instance)
    if convention == 'protocol':
        request = types.SimpleNamespace(
            id=envelope.get('id'),
            payload=envelope.get('payload') or {},
            context=envelope.get('context') or {},
        )
        result = target(request)
    else:
        kwargs = dict(envelope.get('kwargs') or {})
        piped = envelope.get('piped')
        if piped is not None:
            for alias in ('input', 'stdin'):
                if alias not in kwargs and accepts_keyword(target, alias):
                    kwargs[alias] = piped
        result = target(**kwargs)
    if inspect.iscoroutine(result):
        result = asyncio.run(result)
    emit({'ok': True, 'result': result})


try:
    main()
except Exception as exc:
    emit({'ok': False, 'error': {'kind': type(exc).__name__, 'message': str(exc)}})
"##;

/// Supported module runtimes, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRuntime {
    /// `.py` modules, executed through `python3` with the bundled shims
    Python,
    /// `.sh` modules, executed through `sh`
    Shell,
}

/// A fully resolved child invocation.
#[derive(Debug, Clone)]
pub struct RunnerSpec {
    /// Program to spawn
    pub command: String,

    /// Arguments, shim first for python runners
    pub args: Vec<String>,

    /// Environment overrides projected into the child
    pub env: Vec<(String, String)>,
}

impl ModuleRuntime {
    /// Runtime for a module file, by extension.
    pub fn for_module_file(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "py" => Some(Self::Python),
            "sh" => Some(Self::Shell),
            _ => None,
        }
    }

    /// Probe invocation for this runtime, when probing applies.
    ///
    /// Shell modules are always plain callables, so they have no probe.
    pub fn probe_spec(
        &self,
        module_file: &Path,
        attribute: &str,
        search_path: &[PathBuf],
    ) -> Option<RunnerSpec> {
        match self {
            Self::Python => Some(RunnerSpec {
                command: "python3".to_string(),
                args: vec![
                    "-c".to_string(),
                    PYTHON_PROBE_SHIM.to_string(),
                    module_file.display().to_string(),
                    attribute.to_string(),
                ],
                env: runner_env(search_path),
            }),
            Self::Shell => None,
        }
    }

    /// Call invocation for this runtime.
    pub fn call_spec(
        &self,
        module_file: &Path,
        attribute: &str,
        convention: &str,
        search_path: &[PathBuf],
    ) -> RunnerSpec {
        match self {
            Self::Python => RunnerSpec {
                command: "python3".to_string(),
                args: vec![
                    "-c".to_string(),
                    PYTHON_CALL_SHIM.to_string(),
                    module_file.display().to_string(),
                    attribute.to_string(),
                    convention.to_string(),
                ],
                env: runner_env(search_path),
            },
            Self::Shell => RunnerSpec {
                command: "sh".to_string(),
                args: vec![module_file.display().to_string(), attribute.to_string()],
                env: runner_env(search_path),
            },
        }
    }
}

/// Environment projected into the child.
///
/// The loader search path is exported under `PYTHONPATH` (ahead of any
/// inherited entries, so the child resolves imports exactly like the host)
/// and under `SKIFF_MODULE_PATH` for non-python runners.
fn runner_env(search_path: &[PathBuf]) -> Vec<(String, String)> {
    let mut entries: Vec<String> = search_path
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let module_path = entries.join(":");
    if let Ok(existing) = std::env::var("PYTHONPATH")
        && !existing.is_empty()
    {
        entries.push(existing);
    }
    vec![
        ("PYTHONPATH".to_string(), entries.join(":")),
        ("SKIFF_MODULE_PATH".to_string(), module_path),
    ]
}
