fn main() {
    tsh_rs::tsh_main()
}
