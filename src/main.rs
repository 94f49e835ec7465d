fn main() {
    stake_combat::game::run();
}
