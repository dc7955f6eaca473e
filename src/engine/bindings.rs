use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use boa_engine::native_function::NativeFunction;
use boa_engine::object::{FunctionObjectBuilder, JsObject};
use boa_engine::property::Attribute;
use boa_engine::value::JsValue;
use boa_engine::{Context, JsResult, JsString, js_string};
use boa_gc::{Finalize, Trace, empty_trace};
use tracing::{error, info, warn};

use super::{EngineFactory, OutputSink};

/// Host-side data captured into native functions.
#[derive(Clone)]
struct Host {
    sink: OutputSink,
    version: String,
    server_dir: PathBuf,
    started: Instant,
}

impl Finalize for Host {}

// SAFETY: holds no GC-managed values.
unsafe impl Trace for Host {
    empty_trace!();
}

impl Host {
    fn from_factory(factory: &EngineFactory) -> Self {
        Self {
            sink: factory.sink.clone(),
            version: factory.version.clone(),
            server_dir: factory.server_dir.clone(),
            started: factory.started,
        }
    }
}

/// Coerce every argument to a string, space-separated. The `print`/logging
/// flavor of stringification.
fn stringify_args(args: &[JsValue], ctx: &mut Context) -> JsResult<String> {
    let mut parts = Vec::with_capacity(args.len());
    for value in args {
        parts.push(value.to_string(ctx)?.to_std_string_escaped());
    }
    Ok(parts.join(" "))
}

/// Tab-separated debug rendering: expands objects and quotes strings.
fn display_args(args: &[JsValue]) -> String {
    args.iter()
        .map(|value| value.display().to_string())
        .collect::<Vec<_>>()
        .join("\t")
}

fn register_global(ctx: &mut Context, name: &str, function: NativeFunction) -> anyhow::Result<()> {
    let function = FunctionObjectBuilder::new(ctx.realm(), function).build();
    ctx.register_global_property(JsString::from(name), function, Attribute::all())
        .map_err(|err| anyhow!("could not register {name}: {err}"))
}

/// The base binding set, present in every state.
pub(crate) fn install_base(ctx: &mut Context, factory: &EngineFactory) -> anyhow::Result<()> {
    let host = Host::from_factory(factory);

    register_global(
        ctx,
        "print",
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, host: &Host, ctx| {
                (host.sink)(&stringify_args(args, ctx)?);
                Ok(JsValue::undefined())
            },
            host.clone(),
        ),
    )?;

    register_global(
        ctx,
        "log",
        NativeFunction::from_copy_closure(|_this, args, ctx| {
            info!("{}", stringify_args(args, ctx)?);
            Ok(JsValue::undefined())
        }),
    )?;

    register_global(
        ctx,
        "warn",
        NativeFunction::from_copy_closure(|_this, args, ctx| {
            warn!("{}", stringify_args(args, ctx)?);
            Ok(JsValue::undefined())
        }),
    )?;

    register_global(
        ctx,
        "err",
        NativeFunction::from_copy_closure(|_this, args, ctx| {
            error!("{}", stringify_args(args, ctx)?);
            Ok(JsValue::undefined())
        }),
    )?;

    register_global(
        ctx,
        "version",
        NativeFunction::from_copy_closure_with_captures(
            |_this, _args, host: &Host, _ctx| Ok(JsString::from(host.version.as_str()).into()),
            host.clone(),
        ),
    )?;

    register_global(
        ctx,
        "unixnano",
        NativeFunction::from_copy_closure(|_this, _args, _ctx| {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as f64)
                .unwrap_or(0.0);
            Ok(JsValue::from(nanos))
        }),
    )?;

    Ok(())
}

/// The privileged `server.*` namespace. Installation depends on the
/// capability flag carried by the factory.
pub(crate) fn install_privileged(ctx: &mut Context, factory: &EngineFactory) -> anyhow::Result<()> {
    let host = Host::from_factory(factory);
    let server = JsObject::with_object_proto(ctx.intrinsics());

    let info_fn = FunctionObjectBuilder::new(
        ctx.realm(),
        NativeFunction::from_copy_closure_with_captures(
            |_this, _args, host: &Host, _ctx| {
                let info = format!("bosun {}, serving {}", host.version, host.server_dir.display());
                Ok(JsString::from(info.as_str()).into())
            },
            host.clone(),
        ),
    )
    .build();
    server
        .set(js_string!("info"), info_fn, false, ctx)
        .map_err(|err| anyhow!("could not register server.info: {err}"))?;

    let uptime_fn = FunctionObjectBuilder::new(
        ctx.realm(),
        NativeFunction::from_copy_closure_with_captures(
            |_this, _args, host: &Host, _ctx| {
                Ok(JsValue::from(host.started.elapsed().as_secs_f64()))
            },
            host,
        ),
    )
    .build();
    server
        .set(js_string!("uptime"), uptime_fn, false, ctx)
        .map_err(|err| anyhow!("could not register server.uptime: {err}"))?;

    ctx.register_global_property(js_string!("server"), server, Attribute::all())
        .map_err(|err| anyhow!("could not register the server namespace: {err}"))?;

    Ok(())
}

/// Console-session extras, installed only on the state the operator's
/// session owns. `pprint` is the auto-print call the console wraps bare
/// expressions in.
pub(crate) fn install_console(ctx: &mut Context, factory: &EngineFactory) -> anyhow::Result<()> {
    let host = Host::from_factory(factory);

    register_global(
        ctx,
        "pprint",
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, host: &Host, _ctx| {
                (host.sink)(&display_args(args));
                Ok(JsValue::undefined())
            },
            host.clone(),
        ),
    )?;

    register_global(
        ctx,
        "serverdir",
        NativeFunction::from_copy_closure_with_captures(
            |_this, args, host: &Host, _ctx| {
                let mut path = host.server_dir.clone();
                if let Some(name) = args.first().and_then(|v| v.as_string()) {
                    path.push(name.to_std_string_escaped());
                }
                Ok(JsString::from(path.to_string_lossy().as_ref()).into())
            },
            host,
        ),
    )?;

    Ok(())
}
