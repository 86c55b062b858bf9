use carillon::CarillonServer;

use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "carillon",
    about = "Plays a bell-choir song file through the default audio device"
)]
struct Opt {
    /// Song file with one `<PITCH> <LENGTH>` pair per line.
    #[structopt(parse(from_os_str), default_value = "songs/mary_lamb.txt")]
    song: PathBuf,

    /// Also capture the performance to a WAV file.
    #[structopt(short = "r", long = "recording", parse(from_os_str))]
    recording_path: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let opt = Opt::from_args();

    let server = CarillonServer::new(opt.recording_path);
    if let Err(err) = server.run(&opt.song) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
