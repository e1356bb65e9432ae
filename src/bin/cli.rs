use clap::{App, Arg, ArgMatches, SubCommand};
use shmlog::{
    ConsoleSink, CursorPolicy, IngestConfig, IngestContext, IngestionPump, JournalSink,
    RingBufferHandle, SegmentConfig, ShmLogError, Result, shutdown_on_signal,
};
use std::{str::FromStr, time::Duration};

fn main() -> Result<()> {
    let matches = App::new("shmlog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Drain log records from a shared memory ring")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Enable debug logging (RUST_LOG overrides)"),
        )
        .subcommand(
            SubCommand::with_name("watch")
                .about("Poll the segment and print/persist records until stopped")
                .args(&segment_args())
                .args(&ingest_args())
                .arg(
                    Arg::with_name("cycles")
                        .short("c")
                        .long("cycles")
                        .value_name("COUNT")
                        .help("Stop after this many poll cycles")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("drain")
                .about("Run exactly one poll cycle")
                .args(&segment_args())
                .args(&ingest_args()),
        )
        .subcommand(
            SubCommand::with_name("inspect")
                .about("Show header cursors and pending data without consuming it")
                .args(&segment_args()),
        )
        .subcommand(
            SubCommand::with_name("journal")
                .about("Print rows stored in a journal file")
                .arg(
                    Arg::with_name("path")
                        .value_name("PATH")
                        .help("Journal file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("tail")
                        .short("t")
                        .long("tail")
                        .value_name("COUNT")
                        .help("Only print the last COUNT rows")
                        .takes_value(true),
                ),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match matches.subcommand() {
        ("watch", Some(watch_matches)) => handle_watch(watch_matches, false),
        ("drain", Some(drain_matches)) => handle_watch(drain_matches, true),
        ("inspect", Some(inspect_matches)) => handle_inspect(inspect_matches),
        ("journal", Some(journal_matches)) => handle_journal(journal_matches),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn segment_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name("name")
            .short("n")
            .long("name")
            .value_name("NAME")
            .help("Name of the shared segment")
            .takes_value(true),
        Arg::with_name("file")
            .short("f")
            .long("file")
            .value_name("FILE")
            .help("Backing file (default /dev/shm/<NAME>)")
            .takes_value(true),
        Arg::with_name("size")
            .short("s")
            .long("size")
            .value_name("SIZE")
            .help("Segment size in bytes (default 10485760)")
            .takes_value(true),
        Arg::with_name("slot_size")
            .long("slot-size")
            .value_name("SIZE")
            .help("Slot size in bytes (default 256)")
            .takes_value(true),
        Arg::with_name("config")
            .long("config")
            .value_name("FILE")
            .help("JSON configuration file; flags override its values")
            .takes_value(true),
    ]
}

fn ingest_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name("period")
            .short("p")
            .long("period-ms")
            .value_name("MILLIS")
            .help("Poll period in milliseconds (default 100)")
            .takes_value(true),
        Arg::with_name("journal")
            .short("j")
            .long("journal")
            .value_name("PATH")
            .help("Persist records to this journal file")
            .takes_value(true),
        Arg::with_name("fail_closed")
            .long("fail-closed")
            .help("Refuse to drain when cursors are not slot aligned"),
        Arg::with_name("quiet")
            .short("q")
            .long("quiet")
            .help("Do not print records to stdout"),
    ]
}

fn parse_value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>> {
    match matches.value_of(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ShmLogError::invalid_parameter(name, format!("Invalid value '{}'", raw))),
        None => Ok(None),
    }
}

fn build_config(matches: &ArgMatches) -> Result<IngestConfig> {
    let mut config = match matches.value_of("config") {
        Some(path) => IngestConfig::from_json_file(path)?,
        None => IngestConfig::default(),
    };

    let segment: &mut SegmentConfig = &mut config.segment;
    if let Some(name) = matches.value_of("name") {
        segment.name = name.to_string();
    }
    if let Some(file) = matches.value_of("file") {
        segment.file_path = Some(file.into());
    }
    if let Some(size) = parse_value(matches, "size")? {
        segment.size = size;
    }
    if let Some(slot_size) = parse_value(matches, "slot_size")? {
        segment.slot_size = slot_size;
    }

    if let Some(period) = parse_value::<u64>(matches, "period")? {
        config.poll_period = Duration::from_millis(period);
    }
    if let Some(journal) = matches.value_of("journal") {
        config.journal_path = Some(journal.into());
    }
    if matches.is_present("fail_closed") {
        config.cursor_policy = CursorPolicy::FailClosed;
    }

    config.validate()?;
    Ok(config)
}

fn handle_watch(matches: &ArgMatches, single: bool) -> Result<()> {
    let config = build_config(matches)?;
    println!(
        "Segment '{}' ({}), poll every {:?}, {} cursors",
        config.segment.name,
        config.segment.file_path().display(),
        config.poll_period,
        config.cursor_policy.name()
    );

    let mut context = IngestContext::from_config(config)?;
    if !matches.is_present("quiet") {
        context.add_sink(Box::new(ConsoleSink::stdout()));
    }

    let mut pump = IngestionPump::new(context)?;
    let stats = if single {
        pump.run_cycles(1)?
    } else {
        match parse_value::<u64>(matches, "cycles")? {
            Some(cycles) => pump.run_cycles(cycles)?,
            None => {
                let shutdown_rx = shutdown_on_signal()?;
                pump.run(&shutdown_rx)?
            }
        }
    };

    println!("{}", stats.summary());
    Ok(())
}

fn handle_inspect(matches: &ArgMatches) -> Result<()> {
    let config = build_config(matches)?;
    let mut handle = RingBufferHandle::attach(config.segment)?;
    let snapshot = handle.inspect()?;

    println!("Segment: {} ({})", handle.name(), handle.path().display());
    println!("  Size: {} bytes", handle.size());
    println!("  Log area: {} bytes", snapshot.log_area_size);
    println!("  Write pos: {}", snapshot.header.write_pos);
    println!("  Read pos: {}", snapshot.header.read_pos);
    println!("  Pending: {} bytes, {} occupied slots", snapshot.pending_bytes, snapshot.pending_slots);
    for span in &snapshot.spans {
        println!("  Span: [{}, {})", span.offset, span.end());
    }
    Ok(())
}

fn handle_journal(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .value_of("path")
        .ok_or_else(|| ShmLogError::invalid_parameter("path", "Journal path is required"))?;
    let rows = JournalSink::read_all(path)?;
    let skip = match parse_value::<usize>(matches, "tail")? {
        Some(tail) => rows.len().saturating_sub(tail),
        None => 0,
    };

    for row in rows.iter().skip(skip) {
        println!("{:>8}  {}  {}", row.id, row.timestamp, row.content);
    }
    println!("{} rows", rows.len());
    Ok(())
}
