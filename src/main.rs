fn main() {
    uix::cli::run();
}
