/// Turn the `-1` error convention of libc calls into an `io::Result` carrying `errno`.
pub fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> std::io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(std::io::Error::last_os_error()),
        _ => Ok(res),
    }
}

#[cfg(test)]
mod test {
    use super::cerr;

    #[test]
    fn minus_one_is_an_os_error() {
        // SAFETY: `kill` with an invalid signal number fails with EINVAL without side effects.
        let res = cerr(unsafe { libc::kill(std::process::id() as libc::pid_t, -1) });
        assert_eq!(res.unwrap_err().raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn other_values_pass_through() {
        assert_eq!(cerr(0).unwrap(), 0);
        assert_eq!(cerr(42i64).unwrap(), 42);
        assert_eq!(cerr(-2isize).unwrap(), -2);
    }
}
