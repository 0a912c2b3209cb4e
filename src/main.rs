fn main() {
    rampart::uci::run_uci_loop();
}
