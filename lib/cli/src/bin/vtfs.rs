use vtfs_cli::VtfsCmd;

fn main() {
    VtfsCmd::run();
}
