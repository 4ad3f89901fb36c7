use qclassify::{Config, Detection, Frame, Session};

fn main() -> Result<(), qclassify::Error> {
    use std::io::BufRead;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args();

    let _ = args.next();
    let in_file_name = match args.next() {
        Some(name) => name,
        None => {
            eprintln!("usage: dump_report <detections file> [source fps] [frame width] [frame height]");
            std::process::exit(2);
        }
    };
    let source_fps: f32 = args.next().and_then(|v| v.parse().ok()).unwrap_or(25.0);
    let width: u32 = args.next().and_then(|v| v.parse().ok()).unwrap_or(1280);
    let height: u32 = args.next().and_then(|v| v.parse().ok()).unwrap_or(720);

    let dets_file = std::fs::File::open(in_file_name)?;
    let mut session = Session::new(Config::from_env()?, source_fps)?;

    for line in std::io::BufReader::new(dets_file).lines() {
        let line = line?;

        let (index, dets): (u64, Vec<Detection>) = if let Some(idx) = line.find(':') {
            let (index, vector) = line.split_at(idx);

            match (index.trim().parse::<u64>(), serde_json::from_str(&vector[1..])) {
                (Ok(index), Ok(vector)) => (index, vector),
                (Ok(_), _) => {
                    log::error!("wrong file format: parse json failed");
                    continue;
                }
                (_, Ok(_)) => {
                    log::error!("wrong file format: parse frame index failed");
                    continue;
                }
                _ => {
                    log::error!("wrong file format: parse failed");
                    continue;
                }
            }
        } else {
            log::error!("wrong file format: expected `:`");
            continue;
        };

        session.process_frame(&Frame::new(index, (width, height), dets))?;

        if session.is_saturated() {
            break;
        }
    }

    println!("{}", session.finish().to_json_pretty()?);

    Ok(())
}
