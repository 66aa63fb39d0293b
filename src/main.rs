use braille_transcode::{
    Grade, TableInfo, TableRegistry, TranslationSession, VerbosityLevel, cell,
};
use clap::{Arg, Command};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("braille-transcode")
        .version("0.1.0")
        .about("Table-driven braille translation CLI")
        .arg(
            Arg::new("text")
                .help("Text to translate (or braille pattern characters with --back)")
                .required_unless_present("list")
                .index(1),
        )
        .arg(
            Arg::new("tables-dir")
                .long("tables-dir")
                .short('d')
                .help("Directory of JSON table files")
                .default_value("tables"),
        )
        .arg(
            Arg::new("table")
                .long("table")
                .short('t')
                .help("Table id (e.g. en-us-g2); overrides --locale/--grade"),
        )
        .arg(
            Arg::new("locale")
                .long("locale")
                .short('l')
                .help("Locale tag")
                .default_value("en-US"),
        )
        .arg(
            Arg::new("grade")
                .long("grade")
                .short('g')
                .help("Braille grade, 1 or 2")
                .default_value("1"),
        )
        .arg(
            Arg::new("eight-dot")
                .long("eight-dot")
                .help("Select an 8-dot table")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("back")
                .long("back")
                .short('b')
                .help("Back-translate braille pattern characters to text")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cursor")
                .long("cursor")
                .short('c')
                .help("Cursor offset to map to the other representation")
                .default_value("0"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("List available tables and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show cells, position maps, and cursor mapping")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let tables_dir = matches.get_one::<String>("tables-dir").unwrap();
    let verbose = matches.get_flag("verbose");

    let mut registry = TableRegistry::from_dir(Path::new(tables_dir))?;
    registry.with_verbosity(if verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    });

    if matches.get_flag("list") {
        for info in registry.list_available() {
            println!("{}", info);
        }
        return Ok(());
    }

    let info = match matches.get_one::<String>("table") {
        Some(id) => registry
            .list_available()
            .into_iter()
            .find(|info| &info.id == id)
            .ok_or_else(|| format!("No table with id '{}'", id))?,
        None => {
            let locale = matches.get_one::<String>("locale").unwrap();
            let grade = Grade::try_from(matches.get_one::<String>("grade").unwrap().parse::<u8>()?)?;
            TableInfo::new("cli", locale, grade, matches.get_flag("eight-dot"))?
        }
    };

    let session = TranslationSession::open(&registry, &info)?;
    let text = matches.get_one::<String>("text").unwrap();
    let cursor: usize = matches.get_one::<String>("cursor").unwrap().parse()?;

    if matches.get_flag("back") {
        let cells: Vec<u8> = text
            .chars()
            .map(|c| cell::unicode_to_mask(c).ok_or_else(|| format!("'{}' is not a braille pattern", c)))
            .collect::<Result<_, _>>()?;
        let result = session.back_translate_with_cursor(&cells, cursor)?;
        println!("{}", result.text);
        if verbose {
            println!("cells→text: {:?}", result.braille_to_text);
            println!("cursor: cell {} → text offset {}", cursor, result.cursor_position);
        }
    } else {
        let result = session.translate_with_cursor(text, cursor)?;
        println!("{}", cell::cells_to_unicode(&result.cells));
        if verbose {
            let hex: Vec<String> = result.cells.iter().map(|c| format!("0x{:02X}", c)).collect();
            println!("cells: [{}]", hex.join(", "));
            println!("text→cells: {:?}", result.text_to_braille);
            println!("cells→text: {:?}", result.braille_to_text);
            println!("cursor: text offset {} → cell {}", cursor, result.cursor_position);
        }
    }

    Ok(())
}
